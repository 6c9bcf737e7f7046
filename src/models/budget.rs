//! The shared budget document
//!
//! A budget aggregates its members and their running totals. Every member
//! card keeps `balance == income - expenses`, and the budget total is the sum
//! of member balances. Totals change only through [`Budget::apply_delta`],
//! which is what write batches call for every transaction they record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::currency::Currency;
use super::ids::{BudgetId, UserId};
use super::money::Money;
use super::transaction::TransactionKind;
use super::user::User;

/// Maximum number of members a budget can have
pub const MAX_MEMBERS: usize = 4;

/// Length of generated invite codes
pub const INVITE_CODE_LEN: usize = 8;

const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    #[default]
    Member,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRole::Owner => write!(f, "owner"),
            MemberRole::Member => write!(f, "member"),
        }
    }
}

/// A user's card inside a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: MemberRole,
    pub balance: Money,
    pub income: Money,
    pub expenses: Money,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn from_user(user: &User, role: MemberRole) -> Self {
        Self {
            user_id: user.id,
            name: user.display_name.clone(),
            email: user.email.clone(),
            role,
            balance: Money::zero(),
            income: Money::zero(),
            expenses: Money::zero(),
            joined_at: Utc::now(),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == MemberRole::Owner
    }
}

/// Change to a member's running totals caused by transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberDelta {
    pub income: Money,
    pub expenses: Money,
}

impl MemberDelta {
    /// Effect of recording a transaction
    pub fn for_transaction(kind: TransactionKind, amount: Money) -> Self {
        match kind {
            TransactionKind::Income => Self {
                income: amount,
                expenses: Money::zero(),
            },
            TransactionKind::Expense => Self {
                income: Money::zero(),
                expenses: amount,
            },
        }
    }

    /// Effect of removing what `self` added
    pub fn reversed(self) -> Self {
        Self {
            income: -self.income,
            expenses: -self.expenses,
        }
    }

    /// Signed change to the member balance
    pub fn balance(&self) -> Money {
        self.income - self.expenses
    }

    pub fn is_zero(&self) -> bool {
        self.income.is_zero() && self.expenses.is_zero()
    }
}

impl std::ops::Add for MemberDelta {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            income: self.income + other.income,
            expenses: self.expenses + other.expenses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner_id: UserId,

    /// Code other family members use to join
    pub invite_code: String,

    /// Currency all amounts in this budget are recorded in
    #[serde(default)]
    pub currency: Currency,

    pub members: Vec<Member>,

    /// Sum of member balances
    pub total_balance: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a budget owned by `owner`, who becomes its first member
    pub fn new(name: impl Into<String>, owner: &User, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            name: name.into().trim().to_string(),
            description: String::new(),
            owner_id: owner.id,
            invite_code: generate_invite_code(),
            currency,
            members: vec![Member::from_user(owner, MemberRole::Owner)],
            total_balance: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn member(&self, user_id: UserId) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn member_mut(&mut self, user_id: UserId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.user_id == user_id)
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.member(user_id).is_some()
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_MEMBERS
    }

    /// Free member slots left
    pub fn open_slots(&self) -> usize {
        MAX_MEMBERS.saturating_sub(self.members.len())
    }

    /// Add a user as a regular member
    pub fn add_member(&mut self, user: &User) -> Result<(), MembershipError> {
        if self.is_member(user.id) {
            return Err(MembershipError::AlreadyMember);
        }
        if self.is_full() {
            return Err(MembershipError::Full);
        }
        self.members.push(Member::from_user(user, MemberRole::Member));
        self.touch();
        Ok(())
    }

    /// Remove a member. The owner cannot leave their own budget.
    pub fn remove_member(&mut self, user_id: UserId) -> Result<Member, MembershipError> {
        if self.is_owner(user_id) {
            return Err(MembershipError::OwnerCannotLeave);
        }
        let index = self
            .members
            .iter()
            .position(|m| m.user_id == user_id)
            .ok_or(MembershipError::NotMember)?;
        let member = self.members.remove(index);
        self.total_balance = self.members_balance();
        self.touch();
        Ok(member)
    }

    /// Apply a transaction effect to a member card and the budget total.
    ///
    /// Returns false when the user is not a member.
    pub fn apply_delta(&mut self, user_id: UserId, delta: MemberDelta) -> bool {
        let Some(member) = self.member_mut(user_id) else {
            return false;
        };
        member.income += delta.income;
        member.expenses += delta.expenses;
        member.balance = member.income - member.expenses;
        self.total_balance += delta.balance();
        self.touch();
        true
    }

    /// Sum of member balances
    pub fn members_balance(&self) -> Money {
        self.members.iter().map(|m| m.balance).sum()
    }

    /// Whether the stored totals agree with each other
    pub fn totals_consistent(&self) -> bool {
        self.members.iter().all(|m| m.balance == m.income - m.expenses)
            && self.total_balance == self.members_balance()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.invite_code)
    }
}

/// Reasons a membership change is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipError {
    AlreadyMember,
    NotMember,
    Full,
    OwnerCannotLeave,
}

impl fmt::Display for MembershipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyMember => write!(f, "User is already a member of this budget"),
            Self::NotMember => write!(f, "User is not a member of this budget"),
            Self::Full => write!(f, "Budget already has {} members", MAX_MEMBERS),
            Self::OwnerCannotLeave => write!(f, "The owner cannot leave their own budget"),
        }
    }
}

impl std::error::Error for MembershipError {}

/// Random upper-case code without look-alike characters
pub fn generate_invite_code() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(INVITE_CODE_LEN)
        .map(|b| INVITE_ALPHABET[(*b as usize) % INVITE_ALPHABET.len()] as char)
        .collect()
}

/// Normalize a typed invite code: drop separators, upper-case
pub fn normalize_invite_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User::new(format!("{}@example.com", name.to_lowercase()), name, "hash")
    }

    #[test]
    fn test_new_budget_has_owner_member() {
        let owner = user("Anna");
        let budget = Budget::new("Family budget", &owner, Currency::Pln);

        assert_eq!(budget.members.len(), 1);
        assert!(budget.members[0].is_owner());
        assert_eq!(budget.invite_code.len(), INVITE_CODE_LEN);
        assert!(budget.totals_consistent());
    }

    #[test]
    fn test_add_member_limits() {
        let owner = user("Anna");
        let mut budget = Budget::new("Home", &owner, Currency::Pln);

        assert_eq!(budget.add_member(&owner), Err(MembershipError::AlreadyMember));

        for name in ["Bob", "Cid", "Dee"] {
            budget.add_member(&user(name)).unwrap();
        }
        assert!(budget.is_full());
        assert_eq!(budget.open_slots(), 0);
        assert_eq!(budget.add_member(&user("Eve")), Err(MembershipError::Full));
    }

    #[test]
    fn test_apply_delta_keeps_totals() {
        let owner = user("Anna");
        let partner = user("Bob");
        let mut budget = Budget::new("Home", &owner, Currency::Pln);
        budget.add_member(&partner).unwrap();

        let income = MemberDelta::for_transaction(TransactionKind::Income, Money::from_minor(10000));
        let expense =
            MemberDelta::for_transaction(TransactionKind::Expense, Money::from_minor(2500));

        assert!(budget.apply_delta(owner.id, income));
        assert!(budget.apply_delta(partner.id, expense));

        assert_eq!(budget.member(owner.id).unwrap().balance.minor(), 10000);
        assert_eq!(budget.member(partner.id).unwrap().balance.minor(), -2500);
        assert_eq!(budget.total_balance.minor(), 7500);
        assert!(budget.totals_consistent());

        assert!(budget.apply_delta(partner.id, expense.reversed()));
        assert_eq!(budget.total_balance.minor(), 10000);
        assert!(budget.totals_consistent());
    }

    #[test]
    fn test_apply_delta_unknown_member() {
        let owner = user("Anna");
        let mut budget = Budget::new("Home", &owner, Currency::Pln);
        let delta = MemberDelta::for_transaction(TransactionKind::Income, Money::from_minor(1));
        assert!(!budget.apply_delta(UserId::new(), delta));
        assert!(budget.total_balance.is_zero());
    }

    #[test]
    fn test_remove_member_updates_total() {
        let owner = user("Anna");
        let partner = user("Bob");
        let mut budget = Budget::new("Home", &owner, Currency::Pln);
        budget.add_member(&partner).unwrap();
        budget.apply_delta(
            partner.id,
            MemberDelta::for_transaction(TransactionKind::Income, Money::from_minor(500)),
        );

        assert_eq!(
            budget.remove_member(owner.id),
            Err(MembershipError::OwnerCannotLeave)
        );
        let removed = budget.remove_member(partner.id).unwrap();
        assert_eq!(removed.balance.minor(), 500);
        assert!(budget.total_balance.is_zero());
    }

    #[test]
    fn test_invite_code_normalization() {
        assert_eq!(normalize_invite_code("ab12-cd34"), "AB12CD34");
        let code = generate_invite_code();
        assert!(code.chars().all(|c| INVITE_ALPHABET.contains(&(c as u8))));
    }
}
