use crate::travel_option::TravelOption;

/// Seat-count arithmetic on a departure.
///
/// These operate on an in-memory row and keep `0 <= available_seats <= total_seats`.
/// The Postgres store expresses the same checks as conditional updates.
impl TravelOption {
    /// Take `quantity` seats (booking created)
    pub fn reserve_seats(&mut self, quantity: i32) -> Result<(), InventoryError> {
        if quantity < 1 {
            return Err(InventoryError::InvalidQuantity(quantity));
        }

        if self.available_seats < quantity {
            return Err(InventoryError::InsufficientSeats {
                requested: quantity,
                available: self.available_seats,
            });
        }

        self.available_seats -= quantity;
        Ok(())
    }

    /// Give back `quantity` seats (booking cancelled)
    pub fn release_seats(&mut self, quantity: i32) -> Result<(), InventoryError> {
        if quantity < 1 {
            return Err(InventoryError::InvalidQuantity(quantity));
        }

        let restored = self.available_seats + quantity;
        if restored > self.total_seats {
            return Err(InventoryError::CapacityExceeded {
                restored,
                total: self.total_seats,
            });
        }

        self.available_seats = restored;
        Ok(())
    }

    /// Seats held by confirmed bookings
    pub fn booked_seats(&self) -> i32 {
        self.total_seats - self.available_seats
    }

    /// Booked share of capacity in `[0, 1]`
    pub fn utilization(&self) -> f64 {
        if self.total_seats <= 0 {
            0.0
        } else {
            1.0 - (self.available_seats as f64 / self.total_seats as f64)
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Seat quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error("Only {available} seats are available.")]
    InsufficientSeats { requested: i32, available: i32 },

    #[error("Restoring seats would exceed capacity: {restored} > {total}")]
    CapacityExceeded { restored: i32, total: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel_option::tests::sample_option;

    #[test]
    fn test_inventory_lifecycle() {
        let mut option = sample_option();
        assert_eq!(option.available_seats, 45);

        option.reserve_seats(5).unwrap();
        assert_eq!(option.available_seats, 40);

        option.release_seats(5).unwrap();
        assert_eq!(option.available_seats, 45);

        let utilization = option.utilization();
        assert!((utilization - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_reserve_more_than_available() {
        let mut option = sample_option();
        let err = option.reserve_seats(46).unwrap_err();
        assert_eq!(err, InventoryError::InsufficientSeats { requested: 46, available: 45 });
        assert_eq!(option.available_seats, 45);

        assert_eq!(option.reserve_seats(0), Err(InventoryError::InvalidQuantity(0)));
    }

    #[test]
    fn test_release_never_exceeds_total() {
        let mut option = sample_option();
        option.available_seats = option.total_seats;
        assert!(matches!(
            option.release_seats(1),
            Err(InventoryError::CapacityExceeded { restored: 181, total: 180 })
        ));
        assert_eq!(option.available_seats, 180);
    }
}
