//! Declarative property schema: what a host needs to render a node's form.
//!
//! Field presentation lives in the static [`FIELDS`] table. Which operations
//! show a field, and whether it is required there, is derived from the
//! operation catalog so the two can never disagree.

use serde::Serialize;

use crate::catalog::{NodeKind, OperationKind};
use crate::credentials::CREDENTIAL_NAME;

// ---------------------------------------------------------------------------
// Field descriptors
// ---------------------------------------------------------------------------

/// One entry of an options dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionValue {
    pub name: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    String,
    Number,
    /// A string input rendered masked.
    Password,
    Options(&'static [OptionValue]),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Text(&'static str),
    Number(f64),
}

/// Extra visibility rule on top of the operation filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShowCondition {
    pub field: &'static str,
    pub values: &'static [&'static str],
}

/// Presentation of a single input field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub default: DefaultValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shown_when: Option<ShowCondition>,
}

impl FieldDescriptor {
    pub const fn new(
        name: &'static str,
        display_name: &'static str,
        kind: PropertyKind,
        description: &'static str,
    ) -> Self {
        let default = match kind {
            PropertyKind::Number => DefaultValue::Number(0.0),
            _ => DefaultValue::Text(""),
        };
        Self {
            name,
            display_name,
            kind,
            default,
            placeholder: None,
            description,
            shown_when: None,
        }
    }

    pub const fn with_default(self, default: DefaultValue) -> Self {
        Self { default, ..self }
    }

    pub const fn with_placeholder(self, placeholder: &'static str) -> Self {
        Self { placeholder: Some(placeholder), ..self }
    }

    pub const fn shown_when(self, field: &'static str, values: &'static [&'static str]) -> Self {
        Self { shown_when: Some(ShowCondition { field, values }), ..self }
    }
}

const RECIPIENT_TYPES: &[OptionValue] = &[
    OptionValue { name: "All Users", value: "all" },
    OptionValue { name: "Specific User", value: "user" },
    OptionValue { name: "Specific Role", value: "role" },
];

const BROKER_TYPES: &[OptionValue] = &[
    OptionValue { name: "Individual (PF)", value: "pf" },
    OptionValue { name: "Company (PJ)", value: "pj" },
];

const USER_STATUSES: &[OptionValue] = &[
    OptionValue { name: "Active", value: "ativo" },
    OptionValue { name: "Inactive", value: "inativo" },
];

use self::PropertyKind::{Number, Options, Password, String as Text};

/// Every input field any operation reads, in form order.
pub static FIELDS: &[FieldDescriptor] = &[
    // proposals
    FieldDescriptor::new("proposalId", "Proposal ID", Text, "The ID of the proposal"),
    FieldDescriptor::new("fileId", "File ID", Text, "The ID of the file to download"),
    FieldDescriptor::new("brokerIdForProposal", "Broker ID", Text, "Broker ID (required if logged user is internal type)"),
    FieldDescriptor::new("observation", "Observation", Text, "Broker observation to add to the proposal"),
    FieldDescriptor::new("statusId", "Status ID", Text, "New status ID to update"),
    FieldDescriptor::new("pmtValue", "New PMT Value", Number, "New PMT value for the proposal"),
    FieldDescriptor::new("portabilityBalance", "Portability Balance", Number, "Portability balance received from bank"),
    FieldDescriptor::new("searchCpf", "CPF", Text, "CPF for proposal search"),
    FieldDescriptor::new("proposalCode", "Proposal Code", Text, "Proposal code for search"),
    FieldDescriptor::new("clientName", "Client Name", Text, "Client name for proposal search"),
    FieldDescriptor::new("documentFile", "Document File", Text, "Base64 encoded document file"),
    FieldDescriptor::new("documentType", "Document Type", Text, "Type of document being uploaded"),
    // commissions, bank operations
    FieldDescriptor::new("commissionGroupId", "Commission Group ID", Text, "The ID of the commission group to retrieve"),
    FieldDescriptor::new("bankId", "Bank ID", Text, "The ID of the bank to search operations for"),
    // notifications
    FieldDescriptor::new("notificationTitle", "Notification Title", Text, "Title of the notification"),
    FieldDescriptor::new("notificationMessage", "Notification Message", Text, "Message content of the notification"),
    FieldDescriptor::new("recipientType", "Recipient Type", Options(RECIPIENT_TYPES), "Type of recipient for the notification")
        .with_default(DefaultValue::Text("all")),
    FieldDescriptor::new("recipientId", "Recipient ID", Text, "ID of the specific user or role (if not sending to all)")
        .shown_when("recipientType", &["user", "role"]),
    // brokers, profiles, users
    FieldDescriptor::new("brokerId", "Broker ID", Text, "The ID of the broker"),
    FieldDescriptor::new("profileId", "Profile ID", Text, "The ID of the profile to get details for"),
    FieldDescriptor::new("userId", "User ID", Text, "The ID of the user"),
    FieldDescriptor::new("login", "Login", Text, "Login username"),
    FieldDescriptor::new("cpf", "CPF", Text, "CPF (numbers only)"),
    FieldDescriptor::new("nome", "Name", Text, "Full name"),
    FieldDescriptor::new("email", "Email", Text, "Email address"),
    FieldDescriptor::new("telefone", "Phone", Text, "Phone number"),
    FieldDescriptor::new("dtNascimento", "Birth Date", Text, "Birth date (DD/MM/YYYY format)")
        .with_placeholder("DD/MM/YYYY"),
    FieldDescriptor::new("tipoCorretor", "Broker Type", Options(BROKER_TYPES), "Type of broker")
        .with_default(DefaultValue::Text("pf")),
    FieldDescriptor::new("cnpj", "CNPJ", Text, "Company CNPJ (required for PJ)")
        .shown_when("tipoCorretor", &["pj"]),
    FieldDescriptor::new("razaoSocial", "Company Name", Text, "Company legal name (required for PJ)")
        .shown_when("tipoCorretor", &["pj"]),
    FieldDescriptor::new("loja", "Store", Text, "Store code"),
    FieldDescriptor::new("logradouro", "Street", Text, "Street address"),
    FieldDescriptor::new("numero", "Number", Text, "Address number"),
    FieldDescriptor::new("bairro", "District", Text, "District/neighborhood"),
    FieldDescriptor::new("cidade", "City", Text, "City name"),
    FieldDescriptor::new("estado", "State", Text, "State abbreviation"),
    FieldDescriptor::new("cep", "ZIP Code", Text, "ZIP/postal code"),
    FieldDescriptor::new("gerente", "Manager", Text, "Manager ID"),
    FieldDescriptor::new("idCentroCusto", "Cost Center ID", Text, "Cost center identifier"),
    FieldDescriptor::new("recebimento", "Payment Method", Text, "Payment receiving method"),
    FieldDescriptor::new("permissoes", "Permissions", Text, "Broker permissions"),
    FieldDescriptor::new("perfilId", "Profile ID", Text, "Profile/role ID for the user"),
    FieldDescriptor::new("senha", "Password", Password, "User password (required for creation)"),
    FieldDescriptor::new("status", "Status", Options(USER_STATUSES), "User status")
        .with_default(DefaultValue::Text("ativo")),
    FieldDescriptor::new("lojaId", "Store ID", Text, "Store ID where user works"),
    FieldDescriptor::new("gerenteId", "Manager ID", Text, "Manager ID for this user"),
];

/// Look up a field's presentation by name.
pub fn field(name: &str) -> Option<&'static FieldDescriptor> {
    FIELDS.iter().find(|f| f.name == name)
}

// ---------------------------------------------------------------------------
// Node description
// ---------------------------------------------------------------------------

/// One entry of the operation dropdown.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOption {
    pub name: &'static str,
    pub value: &'static str,
    pub description: &'static str,
    pub action: &'static str,
}

/// A field as shown on a particular node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescription {
    #[serde(flatten)]
    pub field: FieldDescriptor,
    /// `true` when every operation showing the field requires it.
    pub required: bool,
    /// Operation ids for which the field is shown.
    pub show_for: Vec<&'static str>,
}

/// Full, serialisable description of a node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub group: &'static [&'static str],
    pub version: u32,
    pub usable_as_tool: bool,
    pub credentials: &'static [&'static str],
    pub default_operation: &'static str,
    pub operations: Vec<OperationOption>,
    pub properties: Vec<PropertyDescription>,
}

impl NodeDescription {
    pub fn for_node(kind: NodeKind) -> Self {
        let operations: &[OperationKind] = kind.operations();

        let options = operations
            .iter()
            .map(|op| {
                let spec = op.spec();
                OperationOption {
                    name: spec.name,
                    value: spec.id,
                    description: spec.description,
                    action: spec.action,
                }
            })
            .collect();

        let properties = FIELDS
            .iter()
            .filter_map(|field| {
                let shown: Vec<_> = operations
                    .iter()
                    .map(|op| op.spec())
                    .filter(|spec| spec.reads(field.name))
                    .collect();
                if shown.is_empty() {
                    return None;
                }
                Some(PropertyDescription {
                    field: *field,
                    required: shown.iter().all(|spec| spec.required.contains(&field.name)),
                    show_for: shown.iter().map(|spec| spec.id).collect(),
                })
            })
            .collect();

        Self {
            name: kind.name(),
            display_name: kind.display_name(),
            description: kind.description(),
            icon: kind.icon(),
            group: &["transform"],
            version: 1,
            usable_as_tool: true,
            credentials: &[CREDENTIAL_NAME],
            default_operation: operations.first().map(|op| op.id()).unwrap_or_default(),
            operations: options,
            properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescription> {
        self.properties.iter().find(|p| p.field.name == name)
    }
}
