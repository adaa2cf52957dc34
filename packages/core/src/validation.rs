// ABOUTME: Input validation for escrow and project payloads
// ABOUTME: Collects every violation so the API can report them together

use serde::Serialize;
use std::fmt;

use crate::types::{
    AttachOnChainInput, EscrowCreateInput, MilestoneInput, ProjectCreateInput, MILESTONE_COUNT,
};

/// Longest wallet address accepted from clients
pub const MAX_ADDRESS_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn validate_address(field: &str, address: &str, errors: &mut Vec<ValidationError>) {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        errors.push(ValidationError::new(field, "Address is required"));
    } else if trimmed != address {
        // Stored as given, so padded addresses would never match a filter
        errors.push(ValidationError::new(
            field,
            "Address must not have leading or trailing whitespace",
        ));
    } else if address.chars().count() > MAX_ADDRESS_LENGTH {
        errors.push(ValidationError::new(
            field,
            format!("Address must be at most {} characters", MAX_ADDRESS_LENGTH),
        ));
    }
}

fn validate_parties(client: &str, freelancer: &str, errors: &mut Vec<ValidationError>) {
    validate_address("clientAddress", client, errors);
    validate_address("freelancerAddress", freelancer, errors);

    if !client.trim().is_empty() && client.trim() == freelancer.trim() {
        errors.push(ValidationError::new(
            "freelancerAddress",
            "Client and freelancer must be different parties",
        ));
    }
}

fn validate_on_chain_id(on_chain_id: i64, errors: &mut Vec<ValidationError>) {
    if on_chain_id < 0 {
        errors.push(ValidationError::new(
            "onChainId",
            "On-chain id must be a non-negative integer",
        ));
    }
}

/// A transaction id is optional, but an empty one is a client bug
pub fn validate_tx_id(tx_id: Option<&str>) -> Vec<ValidationError> {
    match tx_id {
        Some(tx) if tx.trim().is_empty() => {
            vec![ValidationError::new("txId", "Transaction id cannot be empty")]
        }
        _ => Vec::new(),
    }
}

pub fn validate_escrow_data(data: &EscrowCreateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_parties(&data.client_address, &data.freelancer_address, &mut errors);

    if data.amount <= 0 {
        errors.push(ValidationError::new("amount", "Amount must be positive"));
    }

    if let Some(on_chain_id) = data.on_chain_id {
        validate_on_chain_id(on_chain_id, &mut errors);
    }

    errors.extend(validate_tx_id(data.tx_id.as_deref()));
    errors
}

fn validate_milestone(index: usize, milestone: &MilestoneInput, errors: &mut Vec<ValidationError>) {
    let prefix = format!("milestones[{}]", index);

    if milestone.title.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{}.title", prefix),
            "Milestone title is required",
        ));
    }

    if milestone.amount <= 0 {
        errors.push(ValidationError::new(
            format!("{}.amount", prefix),
            "Milestone amount must be positive",
        ));
    }
}

pub fn validate_project_data(data: &ProjectCreateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if data.title.trim().is_empty() {
        errors.push(ValidationError::new("title", "Project title is required"));
    }

    validate_parties(&data.client_address, &data.freelancer_address, &mut errors);

    if data.total_amount <= 0 {
        errors.push(ValidationError::new(
            "totalAmount",
            "Total amount must be positive",
        ));
    }

    if data.milestones.len() != MILESTONE_COUNT {
        errors.push(ValidationError::new(
            "milestones",
            format!(
                "Exactly {} milestones are required, got {}",
                MILESTONE_COUNT,
                data.milestones.len()
            ),
        ));
        return errors;
    }

    for (index, milestone) in data.milestones.iter().enumerate() {
        validate_milestone(index, milestone, &mut errors);
    }

    let sum = data
        .milestones
        .iter()
        .try_fold(0i64, |acc, m| acc.checked_add(m.amount));
    match sum {
        Some(sum) if sum == data.total_amount => {}
        Some(sum) => errors.push(ValidationError::new(
            "totalAmount",
            format!(
                "Total amount {} does not match the milestone sum {}",
                data.total_amount, sum
            ),
        )),
        None => errors.push(ValidationError::new(
            "milestones",
            "Milestone amounts overflow",
        )),
    }

    errors
}

pub fn validate_on_chain_input(data: &AttachOnChainInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_on_chain_id(data.on_chain_id, &mut errors);
    errors.extend(validate_tx_id(data.tx_id.as_deref()));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenType;
    use pretty_assertions::assert_eq;

    fn milestone(amount: i64, title: &str) -> MilestoneInput {
        MilestoneInput {
            amount,
            title: title.to_string(),
            description: None,
            attachment: None,
        }
    }

    fn project_input() -> ProjectCreateInput {
        ProjectCreateInput {
            title: "Landing page".to_string(),
            description: Some("Marketing site".to_string()),
            client_address: "SP1CLIENT".to_string(),
            freelancer_address: "SP2FREELANCER".to_string(),
            total_amount: 1_000,
            token_type: TokenType::Stx,
            category_id: Some(1),
            milestones: vec![
                milestone(100, "Wireframes"),
                milestone(200, "Design"),
                milestone(300, "Build"),
                milestone(400, "Launch"),
            ],
        }
    }

    fn escrow_input() -> EscrowCreateInput {
        EscrowCreateInput {
            client_address: "SP1CLIENT".to_string(),
            freelancer_address: "SP2FREELANCER".to_string(),
            amount: 5_000,
            token_type: TokenType::Stx,
            on_chain_id: None,
            tx_id: None,
            description: None,
            category_id: None,
        }
    }

    #[test]
    fn test_validate_project_data_valid() {
        assert!(validate_project_data(&project_input()).is_empty());
    }

    #[test]
    fn test_validate_project_data_wrong_milestone_count() {
        let mut input = project_input();
        input.milestones.pop();

        let errors = validate_project_data(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "milestones");
    }

    #[test]
    fn test_validate_project_data_total_mismatch() {
        let mut input = project_input();
        input.total_amount = 999;

        let errors = validate_project_data(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "totalAmount");
    }

    #[test]
    fn test_validate_project_data_collects_all_errors() {
        let mut input = project_input();
        input.title = "   ".to_string();
        input.milestones[2].title = String::new();
        input.milestones[3].amount = 0;

        let fields: Vec<String> = validate_project_data(&input)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert!(fields.contains(&"title".to_string()));
        assert!(fields.contains(&"milestones[2].title".to_string()));
        assert!(fields.contains(&"milestones[3].amount".to_string()));
    }

    #[test]
    fn test_validate_escrow_same_parties() {
        let mut input = escrow_input();
        input.freelancer_address = input.client_address.clone();

        let errors = validate_escrow_data(&input);
        assert_eq!(
            errors,
            vec![ValidationError::new(
                "freelancerAddress",
                "Client and freelancer must be different parties"
            )]
        );
    }

    #[test]
    fn test_validate_escrow_negative_values() {
        let mut input = escrow_input();
        input.amount = -1;
        input.on_chain_id = Some(-3);

        let fields: Vec<String> = validate_escrow_data(&input)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["amount".to_string(), "onChainId".to_string()]);
    }

    #[test]
    fn test_validate_escrow_address_too_long() {
        let mut input = escrow_input();
        input.client_address = "S".repeat(MAX_ADDRESS_LENGTH + 1);

        let errors = validate_escrow_data(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "clientAddress");
    }

    #[test]
    fn test_validate_escrow_address_length_counts_characters() {
        let mut input = escrow_input();
        input.client_address = "é".repeat(MAX_ADDRESS_LENGTH);

        assert!(validate_escrow_data(&input).is_empty());
    }

    #[test]
    fn test_validate_padded_address_rejected() {
        let mut input = escrow_input();
        input.client_address = " SP1CLIENT ".to_string();

        let errors = validate_escrow_data(&input);
        assert_eq!(
            errors,
            vec![ValidationError::new(
                "clientAddress",
                "Address must not have leading or trailing whitespace"
            )]
        );

        let mut project = project_input();
        project.freelancer_address = "SP2FREELANCER\n".to_string();
        let fields: Vec<String> = validate_project_data(&project)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["freelancerAddress".to_string()]);
    }

    #[test]
    fn test_validate_tx_id() {
        assert!(validate_tx_id(None).is_empty());
        assert!(validate_tx_id(Some("0xabc")).is_empty());
        assert_eq!(validate_tx_id(Some(" ")).len(), 1);
    }

    #[test]
    fn test_validate_on_chain_input() {
        let input = AttachOnChainInput {
            on_chain_id: 0,
            tx_id: None,
        };
        assert!(validate_on_chain_input(&input).is_empty());

        let input = AttachOnChainInput {
            on_chain_id: -1,
            tx_id: Some(String::new()),
        };
        assert_eq!(validate_on_chain_input(&input).len(), 2);
    }
}
