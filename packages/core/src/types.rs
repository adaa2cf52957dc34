use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of milestones every project is split into
pub const MILESTONE_COUNT: usize = 4;

/// Error returned when a stored or user supplied enum value is unknown
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Token an agreement is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    #[default]
    Stx,
    Sbtc,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Stx => "STX",
            TokenType::Sbtc => "SBTC",
        }
    }
}

impl FromStr for TokenType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STX" => Ok(TokenType::Stx),
            "SBTC" => Ok(TokenType::Sbtc),
            other => Err(ParseEnumError::new("token type", other)),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock/release status of a single-payment escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EscrowStatus {
    Pending,
    Locked,
    Released,
}

impl EscrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowStatus::Pending => "PENDING",
            EscrowStatus::Locked => "LOCKED",
            EscrowStatus::Released => "RELEASED",
        }
    }
}

impl FromStr for EscrowStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(EscrowStatus::Pending),
            "LOCKED" => Ok(EscrowStatus::Locked),
            "RELEASED" => Ok(EscrowStatus::Released),
            other => Err(ParseEnumError::new("escrow status", other)),
        }
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a milestone project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    Pending,
    Active,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "PENDING",
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ProjectStatus::Pending),
            "ACTIVE" => Ok(ProjectStatus::Active),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            other => Err(ParseEnumError::new("project status", other)),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a milestone within a project, always in `1..=4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub struct MilestoneNumber(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Milestone number must be between 1 and {max}, got {0}", max = MILESTONE_COUNT)]
pub struct InvalidMilestoneNumber(pub u8);

impl MilestoneNumber {
    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position in `Project::milestones`
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn all() -> impl Iterator<Item = MilestoneNumber> {
        (1..=MILESTONE_COUNT as u8).map(MilestoneNumber)
    }
}

impl TryFrom<u8> for MilestoneNumber {
    type Error = InvalidMilestoneNumber;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value >= 1 && usize::from(value) <= MILESTONE_COUNT {
            Ok(MilestoneNumber(value))
        } else {
            Err(InvalidMilestoneNumber(value))
        }
    }
}

impl From<MilestoneNumber> for u8 {
    fn from(number: MilestoneNumber) -> Self {
        number.0
    }
}

impl fmt::Display for MilestoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference data used to tag agreements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateInput {
    pub username: String,
    pub wallet_address: Option<String>,
}

/// Single-payment agreement between a client and a freelancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Escrow {
    pub id: i32,
    pub client_address: String,
    pub freelancer_address: String,
    pub amount: i64,
    pub token_type: TokenType,
    pub on_chain_id: Option<i64>,
    pub tx_id: Option<String>,
    pub status: EscrowStatus,
    pub funded: bool,
    pub completed: bool,
    pub released: bool,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowCreateInput {
    pub client_address: String,
    pub freelancer_address: String,
    pub amount: i64,
    #[serde(default)]
    pub token_type: TokenType,
    pub on_chain_id: Option<i64>,
    pub tx_id: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
}

impl EscrowCreateInput {
    /// An escrow reported with an on-chain id has already locked its funds
    pub fn initial_status(&self) -> EscrowStatus {
        if self.on_chain_id.is_some() {
            EscrowStatus::Locked
        } else {
            EscrowStatus::Pending
        }
    }
}

/// Partial escrow update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct EscrowUpdate {
    pub on_chain_id: Option<i64>,
    pub tx_id: Option<String>,
    pub status: Option<EscrowStatus>,
    pub funded: Option<bool>,
    pub completed: Option<bool>,
    pub released: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEscrowInput {
    pub tx_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub amount: i64,
    pub title: String,
    pub description: Option<String>,
    pub attachment: Option<String>,
    pub funded: bool,
    pub complete: bool,
    pub released: bool,
    pub completion_description: Option<String>,
    pub completion_attachment: Option<String>,
}

impl From<MilestoneInput> for Milestone {
    fn from(input: MilestoneInput) -> Self {
        Milestone {
            amount: input.amount,
            title: input.title,
            description: input.description,
            attachment: input.attachment,
            funded: false,
            complete: false,
            released: false,
            completion_description: None,
            completion_attachment: None,
        }
    }
}

/// Milestone-based agreement split into four payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub client_address: String,
    pub freelancer_address: String,
    pub total_amount: i64,
    pub token_type: TokenType,
    pub status: ProjectStatus,
    pub on_chain_id: Option<i64>,
    pub tx_id: Option<String>,
    pub category_id: Option<i32>,
    pub milestones: [Milestone; MILESTONE_COUNT],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn milestone(&self, number: MilestoneNumber) -> &Milestone {
        &self.milestones[number.index()]
    }

    pub fn all_milestones_released(&self) -> bool {
        self.milestones.iter().all(|m| m.released)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneInput {
    pub amount: i64,
    pub title: String,
    pub description: Option<String>,
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateInput {
    pub title: String,
    pub description: Option<String>,
    pub client_address: String,
    pub freelancer_address: String,
    pub total_amount: i64,
    #[serde(default)]
    pub token_type: TokenType,
    pub category_id: Option<i32>,
    pub milestones: Vec<MilestoneInput>,
}

impl ProjectCreateInput {
    /// Fresh milestone records, or `None` unless exactly four were supplied
    pub fn milestone_records(&self) -> Option<[Milestone; MILESTONE_COUNT]> {
        let milestones: Vec<Milestone> = self
            .milestones
            .iter()
            .cloned()
            .map(Milestone::from)
            .collect();
        milestones.try_into().ok()
    }
}

/// Partial update of one milestone's columns
#[derive(Debug, Clone)]
pub struct MilestoneUpdate {
    pub number: MilestoneNumber,
    pub funded: Option<bool>,
    pub complete: Option<bool>,
    pub released: Option<bool>,
    pub completion_description: Option<String>,
    pub completion_attachment: Option<String>,
}

impl MilestoneUpdate {
    pub fn new(number: MilestoneNumber) -> Self {
        Self {
            number,
            funded: None,
            complete: None,
            released: None,
            completion_description: None,
            completion_attachment: None,
        }
    }
}

/// Partial project update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub on_chain_id: Option<i64>,
    pub tx_id: Option<String>,
    pub status: Option<ProjectStatus>,
    pub milestone: Option<MilestoneUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachOnChainInput {
    pub on_chain_id: i64,
    pub tx_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundMilestoneInput {
    pub tx_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMilestoneInput {
    pub completion_description: Option<String>,
    pub completion_attachment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseMilestoneInput {
    pub tx_id: Option<String>,
}

/// List filter shared by escrows and projects
#[derive(Debug, Clone, Deserialize)]
pub struct RecordFilter<S> {
    /// Matches either the client or the freelancer address
    pub address: Option<String>,
    pub status: Option<S>,
}

impl<S> Default for RecordFilter<S> {
    fn default() -> Self {
        Self {
            address: None,
            status: None,
        }
    }
}

impl<S: PartialEq> RecordFilter<S> {
    pub fn matches(&self, client: &str, freelancer: &str, status: &S) -> bool {
        let address_ok = self
            .address
            .as_deref()
            .map_or(true, |a| a == client || a == freelancer);
        let status_ok = self.status.as_ref().map_or(true, |s| s == status);
        address_ok && status_ok
    }
}

pub type EscrowFilter = RecordFilter<EscrowStatus>;
pub type ProjectFilter = RecordFilter<ProjectStatus>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(4, true)]
    #[case(5, false)]
    fn test_milestone_number_bounds(#[case] raw: u8, #[case] valid: bool) {
        assert_eq!(MilestoneNumber::try_from(raw).is_ok(), valid);
    }

    #[test]
    fn test_milestone_number_index() {
        let numbers: Vec<usize> = MilestoneNumber::all().map(|n| n.index()).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [
            ProjectStatus::Pending,
            ProjectStatus::Active,
            ProjectStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
        }
        assert!("DONE".parse::<EscrowStatus>().is_err());
    }

    #[test]
    fn test_token_type_json_is_uppercase() {
        let json = serde_json::to_string(&TokenType::Sbtc).unwrap();
        assert_eq!(json, "\"SBTC\"");
        let parsed: TokenType = serde_json::from_str("\"STX\"").unwrap();
        assert_eq!(parsed, TokenType::Stx);
    }

    #[test]
    fn test_escrow_initial_status() {
        let mut input = EscrowCreateInput {
            client_address: "SP1CLIENT".to_string(),
            freelancer_address: "SP2FREELANCER".to_string(),
            amount: 1_000,
            token_type: TokenType::Stx,
            on_chain_id: None,
            tx_id: None,
            description: None,
            category_id: None,
        };
        assert_eq!(input.initial_status(), EscrowStatus::Pending);
        input.on_chain_id = Some(7);
        assert_eq!(input.initial_status(), EscrowStatus::Locked);
    }

    #[test]
    fn test_filter_matches_either_party() {
        let filter = EscrowFilter {
            address: Some("SP2FREELANCER".to_string()),
            status: None,
        };
        assert!(filter.matches("SP1CLIENT", "SP2FREELANCER", &EscrowStatus::Pending));
        assert!(!filter.matches("SP1CLIENT", "SP3OTHER", &EscrowStatus::Pending));

        let filter = EscrowFilter {
            address: None,
            status: Some(EscrowStatus::Released),
        };
        assert!(!filter.matches("a", "b", &EscrowStatus::Locked));
    }

    #[test]
    fn test_new_milestone_starts_unflagged() {
        let milestone = Milestone::from(MilestoneInput {
            amount: 250,
            title: "Design".to_string(),
            description: None,
            attachment: None,
        });
        let value = serde_json::to_value(&milestone).unwrap();
        assert_eq!(value["completionDescription"], serde_json::Value::Null);
        assert_eq!(value["funded"], serde_json::Value::Bool(false));
    }
}
