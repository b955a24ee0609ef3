use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use yatra_shared::Masked;

use crate::validation::ValidationErrors;

pub const MINIMUM_AGE_YEARS: i32 = 13;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 30;

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").unwrap();
    static ref USERNAME: Regex = Regex::new(r"^[A-Za-z0-9@.+_-]{1,150}$").unwrap();
}

/// Indian states and union territories by their two-letter code.
pub const STATES: [(&str, &str); 37] = [
    ("AP", "Andhra Pradesh"),
    ("AR", "Arunachal Pradesh"),
    ("AS", "Assam"),
    ("BR", "Bihar"),
    ("CG", "Chhattisgarh"),
    ("GA", "Goa"),
    ("GJ", "Gujarat"),
    ("HR", "Haryana"),
    ("HP", "Himachal Pradesh"),
    ("JH", "Jharkhand"),
    ("KA", "Karnataka"),
    ("KL", "Kerala"),
    ("MP", "Madhya Pradesh"),
    ("MH", "Maharashtra"),
    ("MN", "Manipur"),
    ("ML", "Meghalaya"),
    ("MZ", "Mizoram"),
    ("NL", "Nagaland"),
    ("OD", "Odisha"),
    ("PB", "Punjab"),
    ("RJ", "Rajasthan"),
    ("SK", "Sikkim"),
    ("TN", "Tamil Nadu"),
    ("TG", "Telangana"),
    ("TR", "Tripura"),
    ("UK", "Uttarakhand"),
    ("UP", "Uttar Pradesh"),
    ("WB", "West Bengal"),
    ("AN", "Andaman and Nicobar Islands"),
    ("CH", "Chandigarh"),
    ("DN", "Dadra and Nagar Haveli"),
    ("DD", "Daman and Diu"),
    ("DL", "Delhi"),
    ("JK", "Jammu and Kashmir"),
    ("LA", "Ladakh"),
    ("LD", "Lakshadweep"),
    ("PY", "Puducherry"),
];

pub fn state_name(code: &str) -> Option<&'static str> {
    STATES.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            "O" => Ok(Gender::Other),
            other => Err(format!("Select a valid choice. {} is not one of the available choices.", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Admin,
}

/// A registered account with its India-specific profile
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Masked<String>,
    pub password_hash: Masked<String>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub pin_code: String,
    /// Empty when not provided
    pub aadhaar_number: Masked<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// `+919876543210` shown as `+91 98765-43210`
    pub fn display_phone(&self) -> String {
        let phone = self.phone.expose();
        match phone.strip_prefix("+91") {
            Some(rest) if rest.len() == 10 && rest.is_ascii() => {
                format!("+91 {}-{}", &rest[..5], &rest[5..])
            }
            _ => phone.clone(),
        }
    }

    /// Last four Aadhaar digits, e.g. `XXXX-XXXX-1234`; empty when none is on file.
    pub fn masked_aadhaar(&self) -> String {
        let aadhaar = self.aadhaar_number.expose();
        if aadhaar.len() == 12 && aadhaar.is_ascii() {
            format!("XXXX-XXXX-{}", &aadhaar[8..])
        } else {
            String::new()
        }
    }

    pub fn role(&self) -> Role {
        if self.is_staff {
            Role::Admin
        } else {
            Role::Customer
        }
    }

    /// Overwrites the profile fields with validated values.
    pub fn apply_profile(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        self.first_name = update.first_name;
        self.last_name = update.last_name;
        self.email = update.email;
        self.phone = Masked::new(update.phone);
        self.date_of_birth = update.date_of_birth;
        self.gender = update.gender;
        self.address = update.address;
        self.city = update.city;
        self.state = update.state;
        self.pin_code = update.pin_code;
        self.aadhaar_number = Masked::new(update.aadhaar_number);
        self.updated_at = now;
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.first_name, self.last_name, self.username)
    }
}

/// Account data ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: Masked<String>,
    pub password_hash: Masked<String>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub is_staff: bool,
}

impl NewUser {
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            address: String::new(),
            city: String::new(),
            state: None,
            pin_code: String::new(),
            aadhaar_number: Masked::default(),
            is_staff: self.is_staff,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registration form as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Masked<String>,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub password1: Masked<String>,
    #[serde(default)]
    pub password2: Masked<String>,
}

/// Cleaned registration, password still in the clear for hashing
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub password: Masked<String>,
}

impl Registration {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            username: self.username,
            email: self.email,
            phone: Masked::new(self.phone),
            password_hash: Masked::new(password_hash),
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            is_staff: false,
        }
    }
}

impl RegistrationForm {
    pub fn validate(&self, today: NaiveDate) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.add("username", "This field is required.");
        } else if !USERNAME.is_match(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let first_name = clean_name(&self.first_name, "first_name", &mut errors);
        let last_name = clean_name(&self.last_name, "last_name", &mut errors);
        let email = clean_email(&self.email, &mut errors);

        let phone = match normalize_phone(self.phone.expose()) {
            Ok(phone) => phone,
            Err(message) => {
                errors.add("phone", message);
                String::new()
            }
        };

        let date_of_birth = clean_date_of_birth(&self.date_of_birth, today, &mut errors);
        let gender = clean_gender(&self.gender, &mut errors);

        let password = self.password1.expose();
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {} characters.", MIN_PASSWORD_LEN),
            );
        }
        if password != self.password2.expose() {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(Registration {
            username,
            first_name,
            last_name,
            email,
            phone,
            date_of_birth,
            gender,
            password: self.password1.clone(),
        })
    }
}

/// Profile edit form as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Masked<String>,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pin_code: String,
    #[serde(default)]
    pub aadhaar_number: Masked<String>,
}

/// Cleaned profile values
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub pin_code: String,
    pub aadhaar_number: String,
}

impl ProfileForm {
    pub fn validate(&self, today: NaiveDate) -> Result<ProfileUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let first_name = clean_name(&self.first_name, "first_name", &mut errors);
        let last_name = clean_name(&self.last_name, "last_name", &mut errors);
        let email = clean_email(&self.email, &mut errors);

        let phone = match normalize_phone(self.phone.expose()) {
            Ok(phone) => phone,
            Err(message) => {
                errors.add("phone", message);
                String::new()
            }
        };

        let date_of_birth = clean_date_of_birth(&self.date_of_birth, today, &mut errors);
        let gender = clean_gender(&self.gender, &mut errors);

        let state = match self.state.trim() {
            "" => None,
            code if state_name(code).is_some() => Some(code.to_string()),
            code => {
                errors.add(
                    "state",
                    format!("Select a valid choice. {} is not one of the available choices.", code),
                );
                None
            }
        };

        let pin_code = clean_pin_code(&self.pin_code).unwrap_or_else(|message| {
            errors.add("pin_code", message);
            String::new()
        });
        let aadhaar_number = clean_aadhaar(self.aadhaar_number.expose()).unwrap_or_else(|message| {
            errors.add("aadhaar_number", message);
            String::new()
        });

        errors.into_result(ProfileUpdate {
            first_name,
            last_name,
            email,
            phone,
            date_of_birth,
            gender,
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state,
            pin_code,
            aadhaar_number,
        })
    }
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            date_of_birth: user.date_of_birth.map(|d| d.to_string()).unwrap_or_default(),
            gender: user.gender.map(|g| g.code().to_string()).unwrap_or_default(),
            address: user.address.clone(),
            city: user.city.clone(),
            state: user.state.clone().unwrap_or_default(),
            pin_code: user.pin_code.clone(),
            aadhaar_number: user.aadhaar_number.clone(),
        }
    }
}

/// Canonical Indian mobile number, `+91` followed by ten digits.
///
/// Spaces and dashes are ignored. Accepts `+91XXXXXXXXXX`, `91XXXXXXXXXX` and `XXXXXXXXXX`.
pub fn normalize_phone(raw: &str) -> Result<String, &'static str> {
    let phone: String = raw.chars().filter(|c| *c != ' ' && *c != '-').collect();
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    if let Some(rest) = phone.strip_prefix("+91") {
        if rest.len() == 10 && all_digits(rest) {
            return Ok(phone);
        }
    } else if phone.len() == 12 && phone.starts_with("91") && all_digits(&phone) {
        return Ok(format!("+{}", phone));
    } else if phone.len() == 10 && all_digits(&phone) {
        return Ok(format!("+91{}", phone));
    }

    Err("Please enter a valid Indian mobile number (10 digits or +91XXXXXXXXXX)")
}

/// Aadhaar with separators removed; empty input means none on file.
pub fn clean_aadhaar(raw: &str) -> Result<String, &'static str> {
    let aadhaar: String = raw.chars().filter(|c| *c != ' ' && *c != '-').collect();
    if aadhaar.is_empty() {
        return Ok(aadhaar);
    }
    if aadhaar.len() != 12 || !aadhaar.chars().all(|c| c.is_ascii_digit()) {
        return Err("Aadhaar number must be exactly 12 digits");
    }
    Ok(aadhaar)
}

pub fn clean_pin_code(raw: &str) -> Result<String, &'static str> {
    let pin = raw.trim();
    if pin.is_empty() {
        return Ok(String::new());
    }
    if pin.len() != 6 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err("PIN code must be exactly 6 digits");
    }
    Ok(pin.to_string())
}

/// Completed years between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let had_birthday = (today.month(), today.day()) >= (dob.month(), dob.day());
    today.year() - dob.year() - if had_birthday { 0 } else { 1 }
}

pub fn check_minimum_age(dob: NaiveDate, today: NaiveDate) -> Result<(), &'static str> {
    if age_on(dob, today) < MINIMUM_AGE_YEARS {
        return Err("You must be at least 13 years old to register.");
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn clean_name(raw: &str, field: &str, errors: &mut ValidationErrors) -> String {
    let name = raw.trim().to_string();
    if name.is_empty() {
        errors.add(field, "This field is required.");
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters.", MAX_NAME_LEN),
        );
    }
    name
}

fn clean_email(raw: &str, errors: &mut ValidationErrors) -> String {
    let email = raw.trim().to_string();
    if email.is_empty() {
        errors.add("email", "This field is required.");
    } else if !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    }
    email
}

fn clean_date_of_birth(raw: &str, today: NaiveDate, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(dob) => {
            if let Err(message) = check_minimum_age(dob, today) {
                errors.add("date_of_birth", message);
            }
            Some(dob)
        }
        Err(_) => {
            errors.add("date_of_birth", "Enter a valid date.");
            None
        }
    }
}

fn clean_gender(raw: &str, errors: &mut ValidationErrors) -> Option<Gender> {
    if raw.trim().is_empty() {
        return None;
    }
    match raw.parse::<Gender>() {
        Ok(gender) => Some(gender),
        Err(message) => {
            errors.add("gender", message);
            None
        }
    }
}
