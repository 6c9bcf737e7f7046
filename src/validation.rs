//! Input validation for forms and command arguments
//!
//! Each validator returns a typed [`ValidationError`]; services convert it
//! into [`BudgetError::Validation`] with `?`.

use chrono::{Months, NaiveDate};
use thiserror::Error;

use crate::error::BudgetError;
use crate::models::{LimitPeriod, Money};

/// Largest amount accepted in any form (minor units)
pub const MAX_FORM_AMOUNT: Money = Money::from_minor(1_000_000_000 * 100);

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 50;
pub const CATEGORY_NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const GOAL_NAME_MAX: usize = 200;
pub const GOAL_DESCRIPTION_MAX: usize = 1000;
pub const PASSWORD_MIN: usize = 6;

/// Oldest transaction date accepted, in years before today
const MAX_DATE_AGE_YEARS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid email address")]
    Email,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Password must contain letters")]
    PasswordNoLetters,

    #[error("Password must contain digits")]
    PasswordNoDigits,

    #[error("Amount must be a number")]
    AmountNotNumber,

    #[error("Amount must be greater than zero")]
    AmountNotPositive,

    #[error("Amount is too large")]
    AmountTooLarge,

    #[error("Name cannot be empty")]
    NameEmpty,

    #[error("Name must be between 2 and 50 characters")]
    NameLength,

    #[error("Name may only contain letters, digits, spaces and hyphens")]
    NameCharacters,

    #[error("Category name cannot be empty")]
    CategoryNameEmpty,

    #[error("Category name cannot be longer than 100 characters")]
    CategoryNameTooLong,

    #[error("Description cannot be longer than {0} characters")]
    DescriptionTooLong(usize),

    #[error("Invite code cannot be empty")]
    InviteCodeEmpty,

    #[error("Invite code must be 6-12 letters and digits")]
    InviteCodeFormat,

    #[error("Date cannot be in the future")]
    DateInFuture,

    #[error("Date cannot be more than 10 years ago")]
    DateTooOld,

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    DateFormat(String),

    /// Several problems with one form, joined with "; "
    #[error("{}", .0.join("; "))]
    Many(Vec<String>),
}

impl From<ValidationError> for BudgetError {
    fn from(e: ValidationError) -> Self {
        BudgetError::Validation(e.to_string())
    }
}

pub type ValidationResult<T = ()> = Result<T, ValidationError>;

/// `something@domain.tld` with no whitespace
pub fn validate_email(email: &str) -> ValidationResult {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::Email);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::Email);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::Email);
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(ValidationError::Email),
    }
}

pub fn validate_password(password: &str) -> ValidationResult {
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::PasswordNoLetters);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordNoDigits);
    }
    Ok(())
}

pub fn validate_amount(amount: Money) -> ValidationResult {
    if !amount.is_positive() {
        return Err(ValidationError::AmountNotPositive);
    }
    if amount > MAX_FORM_AMOUNT {
        return Err(ValidationError::AmountTooLarge);
    }
    Ok(())
}

/// Parse and validate a typed amount
pub fn parse_amount(input: &str) -> ValidationResult<Money> {
    let amount = Money::parse(input).map_err(|_| ValidationError::AmountNotNumber)?;
    validate_amount(amount)?;
    Ok(amount)
}

pub fn validate_username(name: &str) -> ValidationResult {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameEmpty);
    }
    let len = name.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ValidationError::NameLength);
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-')
    {
        return Err(ValidationError::NameCharacters);
    }
    Ok(())
}

pub fn validate_category_name(name: &str) -> ValidationResult {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::CategoryNameEmpty);
    }
    if name.chars().count() > CATEGORY_NAME_MAX {
        return Err(ValidationError::CategoryNameTooLong);
    }
    Ok(())
}

pub fn validate_description(description: &str) -> ValidationResult {
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(ValidationError::DescriptionTooLong(DESCRIPTION_MAX));
    }
    Ok(())
}

/// Invite codes are 6-12 letters and digits; spaces and dashes are ignored
pub fn validate_invite_code(code: &str) -> ValidationResult {
    let cleaned: String = code
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if cleaned.is_empty() {
        return Err(ValidationError::InviteCodeEmpty);
    }
    let len = cleaned.chars().count();
    if !(6..=12).contains(&len) || !cleaned.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InviteCodeFormat);
    }
    Ok(())
}

/// A transaction date must not be in the future nor older than ten years
pub fn validate_transaction_date(date: NaiveDate, today: NaiveDate) -> ValidationResult {
    if date > today {
        return Err(ValidationError::DateInFuture);
    }
    let oldest = today
        .checked_sub_months(Months::new(12 * MAX_DATE_AGE_YEARS))
        .unwrap_or(NaiveDate::MIN);
    if date < oldest {
        return Err(ValidationError::DateTooOld);
    }
    Ok(())
}

/// Parse `YYYY-MM-DD`; also accepts `today` and `yesterday`
pub fn parse_date(input: &str, today: NaiveDate) -> ValidationResult<NaiveDate> {
    match input.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today.pred_opt().unwrap_or(today)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| ValidationError::DateFormat(input.trim().to_string())),
    }
}

/// Fields of a goal form
#[derive(Debug, Clone)]
pub struct GoalInput<'a> {
    pub name: &'a str,
    pub target_amount: Money,
    pub deadline: Option<NaiveDate>,
    pub description: &'a str,
}

/// Check a goal form, collecting every problem
pub fn validate_goal(goal: &GoalInput<'_>, today: NaiveDate) -> ValidationResult {
    let mut errors = Vec::new();

    let name = goal.name.trim();
    if name.is_empty() {
        errors.push("Goal name cannot be empty".to_string());
    } else if name.chars().count() > GOAL_NAME_MAX {
        errors.push(format!(
            "Goal name cannot be longer than {} characters",
            GOAL_NAME_MAX
        ));
    }

    if let Err(e) = validate_amount(goal.target_amount) {
        errors.push(format!("Target amount: {}", e));
    }

    if let Some(deadline) = goal.deadline {
        if deadline <= today {
            errors.push("Deadline must be in the future".to_string());
        }
    }

    if goal.description.chars().count() > GOAL_DESCRIPTION_MAX {
        errors.push(format!(
            "Goal description cannot be longer than {} characters",
            GOAL_DESCRIPTION_MAX
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Many(errors))
    }
}

/// Check a limit form; the period arrives as typed text
pub fn validate_limit(amount: Money, period: &str) -> ValidationResult<LimitPeriod> {
    let mut errors = Vec::new();

    if let Err(e) = validate_amount(amount) {
        errors.push(format!("Limit amount: {}", e));
    }
    let period = match period.parse::<LimitPeriod>() {
        Ok(p) => Some(p),
        Err(_) => {
            errors.push("Invalid limit period".to_string());
            None
        }
    };

    match period {
        Some(p) if errors.is_empty() => Ok(p),
        _ => Err(ValidationError::Many(errors)),
    }
}

/// Trim and strip angle brackets from free text
pub fn sanitize_input(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_email() {
        assert!(validate_email("anna@example.com").is_ok());
        assert!(validate_email(" anna@example.com ").is_ok());
        assert!(validate_email("anna@example").is_err());
        assert!(validate_email("anna example@x.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_password() {
        assert!(validate_password("secret1").is_ok());
        assert_eq!(validate_password("ab1"), Err(ValidationError::PasswordTooShort));
        assert_eq!(validate_password("123456"), Err(ValidationError::PasswordNoLetters));
        assert_eq!(validate_password("abcdefg"), Err(ValidationError::PasswordNoDigits));
    }

    #[test]
    fn test_amount() {
        assert!(validate_amount(Money::from_minor(1)).is_ok());
        assert!(validate_amount(MAX_FORM_AMOUNT).is_ok());
        assert_eq!(validate_amount(Money::zero()), Err(ValidationError::AmountNotPositive));
        assert_eq!(
            validate_amount(MAX_FORM_AMOUNT + Money::from_minor(1)),
            Err(ValidationError::AmountTooLarge)
        );
        assert_eq!(parse_amount("12,50").unwrap(), Money::from_minor(1250));
        assert_eq!(parse_amount("abc"), Err(ValidationError::AmountNotNumber));
    }

    #[test]
    fn test_username() {
        assert!(validate_username("Anna-Maria 2").is_ok());
        assert!(validate_username("Ольга").is_ok());
        assert_eq!(validate_username("A"), Err(ValidationError::NameLength));
        assert_eq!(validate_username("   "), Err(ValidationError::NameEmpty));
        assert_eq!(validate_username("anna!"), Err(ValidationError::NameCharacters));
    }

    #[test]
    fn test_invite_code() {
        assert!(validate_invite_code("ABCD2345").is_ok());
        assert!(validate_invite_code("abcd-2345").is_ok());
        assert_eq!(validate_invite_code("abc"), Err(ValidationError::InviteCodeFormat));
        assert_eq!(validate_invite_code(" "), Err(ValidationError::InviteCodeEmpty));
    }

    #[test]
    fn test_transaction_date() {
        let today = day(2025, 3, 15);
        assert!(validate_transaction_date(today, today).is_ok());
        assert!(validate_transaction_date(day(2015, 3, 15), today).is_ok());
        assert_eq!(
            validate_transaction_date(day(2025, 3, 16), today),
            Err(ValidationError::DateInFuture)
        );
        assert_eq!(
            validate_transaction_date(day(2015, 3, 14), today),
            Err(ValidationError::DateTooOld)
        );
    }

    #[test]
    fn test_parse_date() {
        let today = day(2025, 3, 15);
        assert_eq!(parse_date("today", today).unwrap(), today);
        assert_eq!(parse_date("Yesterday", today).unwrap(), day(2025, 3, 14));
        assert_eq!(parse_date("2025-01-02", today).unwrap(), day(2025, 1, 2));
        assert!(parse_date("02.01.2025", today).is_err());
    }

    #[test]
    fn test_goal_collects_all_errors() {
        let today = day(2025, 3, 15);
        let goal = GoalInput {
            name: " ",
            target_amount: Money::zero(),
            deadline: Some(today),
            description: "",
        };
        let err = validate_goal(&goal, today).unwrap_err().to_string();
        assert_eq!(
            err,
            "Goal name cannot be empty; Target amount: Amount must be greater than zero; Deadline must be in the future"
        );

        let ok = GoalInput {
            name: "Vacation",
            target_amount: Money::from_minor(500_000),
            deadline: Some(day(2025, 8, 1)),
            description: "Sea",
        };
        assert!(validate_goal(&ok, today).is_ok());
    }

    #[test]
    fn test_limit() {
        assert_eq!(
            validate_limit(Money::from_minor(100), "weekly").unwrap(),
            LimitPeriod::Weekly
        );
        let err = validate_limit(Money::zero(), "hourly").unwrap_err().to_string();
        assert!(err.contains("Limit amount"));
        assert!(err.contains("Invalid limit period"));
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("  <b>Milk</b> "), "bMilk/b");
    }

    #[test]
    fn test_into_budget_error() {
        let err: BudgetError = ValidationError::Email.into();
        assert!(err.is_validation());
    }
}
