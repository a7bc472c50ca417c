//! Operation catalog.
//!
//! [`CATALOG`] maps every operation id to its endpoint and field contract.
//! [`Operation`] is the typed form of one request: it is built from an item's
//! parameters only after the required-field check passes, and it alone knows
//! how its fields become a path, a query string and a JSON body.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{json, Map, Number, Value};
use url::Url;

use crate::NodeError;

// ---------------------------------------------------------------------------
// Spec types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Method plus path template; placeholders look like `{brokerId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: &'static str,
}

/// How a request is authorised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMode {
    /// Log in first, then send the call with `Authorization: Bearer <jwt>`.
    Bearer,
    /// The operation is the login call itself.
    Login,
}

/// Static contract of one operation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OperationSpec {
    #[serde(skip)]
    pub kind: OperationKind,
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub action: &'static str,
    /// `None` for operations the API does not back.
    pub endpoint: Option<Endpoint>,
    pub auth: AuthMode,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl OperationSpec {
    const fn new(
        kind: OperationKind,
        id: &'static str,
        name: &'static str,
        description: &'static str,
        action: &'static str,
    ) -> Self {
        Self {
            kind,
            id,
            name,
            description,
            action,
            endpoint: None,
            auth: AuthMode::Bearer,
            required: &[],
            optional: &[],
        }
    }

    const fn at(self, method: HttpMethod, path: &'static str) -> Self {
        Self { endpoint: Some(Endpoint { method, path }), ..self }
    }

    const fn login(self) -> Self {
        Self { auth: AuthMode::Login, ..self }
    }

    const fn requires(self, required: &'static [&'static str]) -> Self {
        Self { required, ..self }
    }

    const fn accepts(self, optional: &'static [&'static str]) -> Self {
        Self { optional, ..self }
    }

    /// Whether the operation reads `field` at all.
    pub fn reads(&self, field: &str) -> bool {
        self.required.iter().chain(self.optional).any(|f| *f == field)
    }

    /// First required field that is absent, null or an empty string.
    pub fn missing_field(&self, params: &Map<String, Value>) -> Option<&'static str> {
        self.required
            .iter()
            .copied()
            .find(|field| !is_present(params.get(*field)))
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Fieldless tag for every operation; discriminants index [`CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateBroker,
    GetBroker,
    ListBrokers,
    UpdateBroker,
    ListProfiles,
    GetProfileDetails,
    ListManagers,
    CreateUser,
    UpdateUser,
    GetUserData,
    ListUsersSimplified,
    CreateFgtsProposal,
    SubmitProposalToBank,
    CreateProposal,
    UploadProposalDocs,
    AddBrokerObservation,
    SearchProposals,
    GetProposalLogs,
    ListProposalStatus,
    ListBankStatus,
    UpdateProposalStatus,
    UpdateBankStatus,
    ChangeProposalPmt,
    RemoveProposalPmt,
    GetBrokerObservations,
    SetPortabilityBalance,
    ListCancellationTypes,
    ListProposalFiles,
    DownloadProposalFile,
    ListCommissionGroups,
    GetCommissionGroup,
    ListBanksWithOperations,
    SearchOperationsByBank,
    ListNotifications,
    SendNotification,
    Authenticate,
    MyData,
}

impl OperationKind {
    pub const ALL: [OperationKind; 37] = {
        use OperationKind::*;
        [
            CreateBroker, GetBroker, ListBrokers, UpdateBroker, ListProfiles,
            GetProfileDetails, ListManagers, CreateUser, UpdateUser, GetUserData,
            ListUsersSimplified, CreateFgtsProposal, SubmitProposalToBank, CreateProposal,
            UploadProposalDocs, AddBrokerObservation, SearchProposals, GetProposalLogs,
            ListProposalStatus, ListBankStatus, UpdateProposalStatus, UpdateBankStatus,
            ChangeProposalPmt, RemoveProposalPmt, GetBrokerObservations, SetPortabilityBalance,
            ListCancellationTypes, ListProposalFiles, DownloadProposalFile, ListCommissionGroups,
            GetCommissionGroup, ListBanksWithOperations, SearchOperationsByBank,
            ListNotifications, SendNotification, Authenticate, MyData,
        ]
    };

    pub fn spec(self) -> &'static OperationSpec {
        &CATALOG[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.spec().id
    }
}

const BROKER_FIELDS: &[&str] = &[
    "login", "cpf", "nome", "email", "telefone", "dtNascimento", "loja", "logradouro",
    "numero", "bairro", "cidade", "estado", "cep", "gerente", "idCentroCusto",
    "recebimento", "permissoes",
];

const UPDATE_BROKER_FIELDS: &[&str] = &[
    "brokerId", "login", "cpf", "nome", "email", "telefone", "dtNascimento", "loja",
    "logradouro", "numero", "bairro", "cidade", "estado", "cep", "gerente",
    "idCentroCusto", "recebimento", "permissoes",
];

const BROKER_OPTIONAL: &[&str] = &["tipoCorretor", "cnpj", "razaoSocial"];

const USER_OPTIONAL: &[&str] = &["status", "telefone", "cpf", "dtNascimento", "lojaId", "gerenteId"];

const PROPOSAL: &[&str] = &["proposalId"];

const STATUS_UPDATE: &[&str] = &["proposalId", "statusId"];

use self::HttpMethod::{Delete, Get, Post, Put};
use self::OperationKind as K;

/// Every operation the nodes expose, ordered like [`OperationKind`].
pub static CATALOG: [OperationSpec; 37] = [
    OperationSpec::new(K::CreateBroker, "createBroker", "Create Broker", "Create a new broker", "Create broker")
        .at(Post, "/api/v2/broker")
        .requires(BROKER_FIELDS)
        .accepts(BROKER_OPTIONAL),
    OperationSpec::new(K::GetBroker, "getBroker", "Get Broker", "Get broker by ID", "Get broker")
        .at(Get, "/api/v2/broker/{brokerId}")
        .requires(&["brokerId"]),
    OperationSpec::new(K::ListBrokers, "listBrokers", "List Brokers", "List all active brokers", "List brokers")
        .at(Get, "/api/v2/broker/list"),
    OperationSpec::new(K::UpdateBroker, "updateBroker", "Update Broker", "Update broker information", "Update broker")
        .at(Put, "/api/v2/broker/{brokerId}")
        .requires(UPDATE_BROKER_FIELDS)
        .accepts(BROKER_OPTIONAL),
    OperationSpec::new(K::ListProfiles, "listProfiles", "List User Profiles", "List all user profiles", "List user profiles")
        .at(Get, "/api/v2/perfis"),
    OperationSpec::new(K::GetProfileDetails, "getProfileDetails", "Get Profile Details", "Get details of a specific profile", "Get profile details")
        .at(Get, "/api/v2/perfis/{profileId}")
        .requires(&["profileId"]),
    OperationSpec::new(K::ListManagers, "listManagers", "List Managers", "List all managers with details", "List managers")
        .at(Get, "/api/v2/gerentes"),
    OperationSpec::new(K::CreateUser, "createUser", "Create User", "Create a new user", "Create user")
        .at(Post, "/api/v2/usuarios")
        .requires(&["login", "nome", "email", "perfilId", "senha"])
        .accepts(USER_OPTIONAL),
    OperationSpec::new(K::UpdateUser, "updateUser", "Update User", "Update user information", "Update user")
        .at(Put, "/api/v2/usuarios/{userId}")
        .requires(&["userId", "login", "nome", "email", "perfilId"])
        .accepts(USER_OPTIONAL),
    OperationSpec::new(K::GetUserData, "getUserData", "Get User Data", "Get user data by ID", "Get user data")
        .at(Get, "/api/v2/usuarios/{userId}")
        .requires(&["userId"]),
    OperationSpec::new(K::ListUsersSimplified, "listUsersSimplified", "List Users (Simplified)", "Get simplified list of all active users", "List users simplified")
        .at(Get, "/api/v2/usuarios/simplificado"),
    OperationSpec::new(K::CreateFgtsProposal, "createFgtsProposal", "Create FGTS Proposal", "Register new FGTS proposal", "Create FGTS proposal")
        .at(Post, "/api/v2/proposta/fgts")
        .accepts(&["brokerIdForProposal"]),
    OperationSpec::new(K::SubmitProposalToBank, "submitProposalToBank", "Submit Proposal to Bank", "Submit proposal for bank processing", "Submit proposal to bank")
        .at(Post, "/api/v2/proposta/{proposalId}/digitar-banco")
        .requires(PROPOSAL),
    OperationSpec::new(K::CreateProposal, "createProposal", "Create Proposal", "Create new proposal (requires broker if internal user)", "Create proposal")
        .at(Post, "/api/v2/proposta")
        .accepts(&["brokerIdForProposal"]),
    OperationSpec::new(K::UploadProposalDocs, "uploadProposalDocs", "Upload Proposal Documents", "Upload documents for proposal", "Upload proposal documents")
        .at(Post, "/api/v2/proposta/{proposalId}/documentos")
        .requires(&["proposalId", "documentFile", "documentType"]),
    OperationSpec::new(K::AddBrokerObservation, "addBrokerObservation", "Add Broker Observation", "Add broker observation to proposal", "Add broker observation")
        .at(Post, "/api/v2/proposta/{proposalId}/observacao-corretor")
        .requires(&["proposalId", "observation"]),
    OperationSpec::new(K::SearchProposals, "searchProposals", "Search Proposals", "Search proposals with filters", "Search proposals")
        .at(Get, "/api/v2/proposta/buscar")
        .accepts(&["searchCpf", "proposalCode", "clientName"]),
    OperationSpec::new(K::GetProposalLogs, "getProposalLogs", "Get Proposal Logs", "Get action logs for proposal", "Get proposal logs")
        .at(Get, "/api/v2/proposta/{proposalId}/logs")
        .requires(PROPOSAL),
    OperationSpec::new(K::ListProposalStatus, "listProposalStatus", "List Proposal Status", "List available proposal status", "List proposal status")
        .at(Get, "/api/v2/proposta/status"),
    OperationSpec::new(K::ListBankStatus, "listBankStatus", "List Bank Status", "List available bank status", "List bank status")
        .at(Get, "/api/v2/proposta/status-banco"),
    OperationSpec::new(K::UpdateProposalStatus, "updateProposalStatus", "Update Proposal Status", "Update proposal status", "Update proposal status")
        .at(Put, "/api/v2/proposta/{proposalId}/status")
        .requires(STATUS_UPDATE),
    OperationSpec::new(K::UpdateBankStatus, "updateBankStatus", "Update Bank Status", "Update bank status", "Update bank status")
        .at(Put, "/api/v2/proposta/{proposalId}/status-banco")
        .requires(STATUS_UPDATE),
    OperationSpec::new(K::ChangeProposalPmt, "changeProposalPmt", "Change Proposal PMT", "Change PMT of proposal", "Change proposal PMT")
        .at(Put, "/api/v2/proposta/{proposalId}/pmt")
        .requires(&["proposalId", "pmtValue"]),
    OperationSpec::new(K::RemoveProposalPmt, "removeProposalPmt", "Remove Proposal PMT", "Remove PMT from proposal", "Remove proposal PMT")
        .at(Delete, "/api/v2/proposta/{proposalId}/pmt")
        .requires(PROPOSAL),
    OperationSpec::new(K::GetBrokerObservations, "getBrokerObservations", "Get Broker Observations", "Get broker observations for proposal", "Get broker observations")
        .at(Get, "/api/v2/proposta/{proposalId}/observacoes-corretor")
        .requires(PROPOSAL),
    OperationSpec::new(K::SetPortabilityBalance, "setPortabilityBalance", "Set Portability Balance", "Set portability balance received from bank", "Set portability balance")
        .at(Put, "/api/v2/proposta/{proposalId}/saldo-portabilidade")
        .requires(&["proposalId", "portabilityBalance"]),
    OperationSpec::new(K::ListCancellationTypes, "listCancellationTypes", "List Cancellation Types", "List available cancellation types", "List cancellation types")
        .at(Get, "/api/v2/proposta/tipos-cancelamento"),
    OperationSpec::new(K::ListProposalFiles, "listProposalFiles", "List Proposal Files", "List files attached to proposal", "List proposal files")
        .at(Get, "/api/v2/proposta/{proposalId}/arquivos")
        .requires(PROPOSAL),
    OperationSpec::new(K::DownloadProposalFile, "downloadProposalFile", "Download Proposal File", "Download proposal file in base64", "Download proposal file")
        .at(Get, "/api/v2/proposta/{proposalId}/arquivo/{fileId}")
        .requires(&["proposalId", "fileId"]),
    OperationSpec::new(K::ListCommissionGroups, "listCommissionGroups", "List Commission Groups", "List commission groups", "List commission groups")
        .at(Get, "/api/v2/comissionamento/grupos"),
    OperationSpec::new(K::GetCommissionGroup, "getCommissionGroup", "Get Commission Group", "Get specific commission group by ID", "Get commission group")
        .at(Get, "/api/v2/comissionamento/grupos/{commissionGroupId}")
        .requires(&["commissionGroupId"]),
    OperationSpec::new(K::ListBanksWithOperations, "listBanksWithOperations", "List Banks with Operations", "List banks with operations", "List banks with operations")
        .at(Get, "/api/v2/operacoes/bancos"),
    OperationSpec::new(K::SearchOperationsByBank, "searchOperationsByBank", "Search Operations by Bank", "Search operations by bank", "Search operations by bank")
        .at(Get, "/api/v2/operacoes/banco/{bankId}")
        .requires(&["bankId"]),
    OperationSpec::new(K::ListNotifications, "listNotifications", "List Notifications", "List notifications", "List notifications")
        .at(Get, "/api/v2/notificacoes"),
    OperationSpec::new(K::SendNotification, "sendNotification", "Send Notification", "Send notification", "Send notification")
        .at(Post, "/api/v2/notificacoes")
        .requires(&["notificationTitle", "notificationMessage"])
        .accepts(&["recipientType", "recipientId"]),
    OperationSpec::new(K::Authenticate, "authenticate", "Authenticate as Broker", "Authenticate as broker and get JWT token", "Authenticate as broker")
        .at(Post, crate::auth::LOGIN_PATH)
        .login(),
    OperationSpec::new(K::MyData, "myData", "Get My Data", "Get current broker data", "Get my broker data"),
];

/// Resolve an operation id to its spec.
pub fn resolve(id: &str) -> Result<&'static OperationSpec, NodeError> {
    static INDEX: OnceLock<HashMap<&'static str, OperationKind>> = OnceLock::new();

    let index = INDEX.get_or_init(|| {
        OperationKind::ALL
            .iter()
            .map(|kind| (kind.id(), *kind))
            .collect()
    });

    index
        .get(id)
        .map(|kind| kind.spec())
        .ok_or_else(|| NodeError::UnknownOperation(id.to_owned()))
}

// ---------------------------------------------------------------------------
// Node kinds
// ---------------------------------------------------------------------------

/// The three node packages built on this catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Users, brokers, proposals, commissions, bank operations, notifications.
    Gestao,
    /// Users and brokers only.
    Usuario,
    /// Broker self-service.
    Corretor,
}

static OPERATIONS: [OperationKind; 37] = OperationKind::ALL;

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Gestao => "corbeeGestao",
            NodeKind::Usuario => "corbeeGestaoUsuario",
            NodeKind::Corretor => "corbeeGestaoCorretor",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            NodeKind::Gestao => "Corbee Gestão",
            NodeKind::Usuario => "Corbee Gestão Usuário",
            NodeKind::Corretor => "Corbee Gestão Corretor",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            NodeKind::Gestao => "Corbee Gestão API - Complete Integration for Users and Brokers",
            NodeKind::Usuario => "Corbee Gestão API - User and Broker Management",
            NodeKind::Corretor => "Corbee Gestão API - Broker Operations",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            NodeKind::Gestao => "file:folder.svg",
            NodeKind::Usuario => "file:user.svg",
            NodeKind::Corretor => "file:archive.svg",
        }
    }

    pub fn operations(self) -> &'static [OperationKind] {
        match self {
            NodeKind::Gestao => &OPERATIONS[..35],
            NodeKind::Usuario => &OPERATIONS[..11],
            NodeKind::Corretor => &OPERATIONS[35..],
        }
    }

    pub fn offers(self, kind: OperationKind) -> bool {
        self.operations().contains(&kind)
    }
}

// ---------------------------------------------------------------------------
// Typed bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerType {
    /// Individual.
    Pf,
    /// Company.
    Pj,
}

impl FromStr for BrokerType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pf" => Ok(BrokerType::Pf),
            "pj" => Ok(BrokerType::Pj),
            _ => Err(()),
        }
    }
}

/// Company data, only carried by `pj` brokers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub cnpj: String,
    pub razao_social: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Broker {
    pub login: String,
    pub cpf: String,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub dt_nascimento: String,
    pub tipo_corretor: BrokerType,
    pub loja: String,
    pub logradouro: String,
    pub numero: String,
    pub bairro: String,
    pub cidade: String,
    pub estado: String,
    pub cep: String,
    pub gerente: String,
    pub id_centro_custo: String,
    pub recebimento: String,
    pub permissoes: String,
    #[serde(flatten)]
    pub company: Option<Company>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Ativo,
    Inativo,
}

impl FromStr for UserStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ativo" => Ok(UserStatus::Ativo),
            "inativo" => Ok(UserStatus::Inativo),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub login: String,
    pub nome: String,
    pub email: String,
    pub perfil_id: String,
    /// Only sent on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub senha: Option<String>,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dt_nascimento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loja_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gerente_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    #[default]
    All,
    User,
    Role,
}

impl FromStr for RecipientType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(RecipientType::All),
            "user" => Ok(RecipientType::User),
            "role" => Ok(RecipientType::Role),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub titulo: String,
    pub mensagem: String,
    pub tipo_destinatario: RecipientType,
    /// Never set when `tipo_destinatario` is `all`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destinatario_id: Option<String>,
}

/// Proposal search filters, sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalSearch {
    pub cpf: Option<String>,
    pub codigo: Option<String>,
    pub nome: Option<String>,
}

impl ProposalSearch {
    fn query(&self) -> Vec<(String, String)> {
        [("cpf", &self.cpf), ("codigo", &self.codigo), ("nome", &self.nome)]
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_owned(), v.clone())))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A fully-validated operation with its typed inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateBroker(Broker),
    GetBroker { broker_id: String },
    ListBrokers,
    UpdateBroker { broker_id: String, broker: Broker },
    ListProfiles,
    GetProfileDetails { profile_id: String },
    ListManagers,
    CreateUser(User),
    UpdateUser { user_id: String, user: User },
    GetUserData { user_id: String },
    ListUsersSimplified,
    CreateFgtsProposal { broker_id: Option<String> },
    SubmitProposalToBank { proposal_id: String },
    CreateProposal { broker_id: Option<String> },
    UploadProposalDocs { proposal_id: String, document_file: String, document_type: String },
    AddBrokerObservation { proposal_id: String, observation: String },
    SearchProposals(ProposalSearch),
    GetProposalLogs { proposal_id: String },
    ListProposalStatus,
    ListBankStatus,
    UpdateProposalStatus { proposal_id: String, status_id: String },
    UpdateBankStatus { proposal_id: String, status_id: String },
    ChangeProposalPmt { proposal_id: String, pmt: Number },
    RemoveProposalPmt { proposal_id: String },
    GetBrokerObservations { proposal_id: String },
    SetPortabilityBalance { proposal_id: String, balance: Number },
    ListCancellationTypes,
    ListProposalFiles { proposal_id: String },
    DownloadProposalFile { proposal_id: String, file_id: String },
    ListCommissionGroups,
    GetCommissionGroup { commission_group_id: String },
    ListBanksWithOperations,
    SearchOperationsByBank { bank_id: String },
    ListNotifications,
    SendNotification(Notification),
    Authenticate,
    MyData,
}

/// Typed access to an item's parameters on behalf of one operation.
struct Fields<'a> {
    operation: &'static str,
    params: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn text(&self, field: &'static str) -> Result<Option<String>, NodeError> {
        match self.params.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(self.invalid(field, "a string")),
        }
    }

    fn required(&self, field: &'static str) -> Result<String, NodeError> {
        self.text(field)?.ok_or(NodeError::MissingField {
            operation: self.operation,
            field,
        })
    }

    fn optional(&self, field: &'static str) -> Result<Option<String>, NodeError> {
        self.text(field)
    }

    fn number(&self, field: &'static str) -> Result<Number, NodeError> {
        match self.params.get(field) {
            Some(Value::Number(n)) => Ok(n.clone()),
            Some(Value::String(s)) if !s.trim().is_empty() => match serde_json::from_str::<Value>(s.trim()) {
                Ok(Value::Number(n)) => Ok(n),
                _ => Err(self.invalid(field, "a number")),
            },
            None | Some(Value::Null) | Some(Value::String(_)) => Err(NodeError::MissingField {
                operation: self.operation,
                field,
            }),
            Some(_) => Err(self.invalid(field, "a number")),
        }
    }

    /// An options field; absent means `default`.
    fn choice<T: FromStr>(
        &self,
        field: &'static str,
        default: T,
        expected: &'static str,
    ) -> Result<T, NodeError> {
        match self.text(field)? {
            Some(value) => value.parse().map_err(|_| self.invalid(field, expected)),
            None => Ok(default),
        }
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> NodeError {
        NodeError::InvalidField {
            operation: self.operation,
            field,
            expected,
        }
    }

    fn broker(&self) -> Result<Broker, NodeError> {
        let tipo_corretor = self.choice("tipoCorretor", BrokerType::Pf, "one of \"pf\", \"pj\"")?;
        let company = match tipo_corretor {
            BrokerType::Pj => Some(Company {
                cnpj: self.optional("cnpj")?.unwrap_or_default(),
                razao_social: self.optional("razaoSocial")?.unwrap_or_default(),
            }),
            BrokerType::Pf => None,
        };

        Ok(Broker {
            login: self.required("login")?,
            cpf: self.required("cpf")?,
            nome: self.required("nome")?,
            email: self.required("email")?,
            telefone: self.required("telefone")?,
            dt_nascimento: self.required("dtNascimento")?,
            tipo_corretor,
            loja: self.required("loja")?,
            logradouro: self.required("logradouro")?,
            numero: self.required("numero")?,
            bairro: self.required("bairro")?,
            cidade: self.required("cidade")?,
            estado: self.required("estado")?,
            cep: self.required("cep")?,
            gerente: self.required("gerente")?,
            id_centro_custo: self.required("idCentroCusto")?,
            recebimento: self.required("recebimento")?,
            permissoes: self.required("permissoes")?,
            company,
        })
    }

    fn user(&self, senha: Option<String>) -> Result<User, NodeError> {
        Ok(User {
            login: self.required("login")?,
            nome: self.required("nome")?,
            email: self.required("email")?,
            perfil_id: self.required("perfilId")?,
            senha,
            status: self.choice("status", UserStatus::Ativo, "one of \"ativo\", \"inativo\"")?,
            telefone: self.optional("telefone")?,
            cpf: self.optional("cpf")?,
            dt_nascimento: self.optional("dtNascimento")?,
            loja_id: self.optional("lojaId")?,
            gerente_id: self.optional("gerenteId")?,
        })
    }

    fn notification(&self) -> Result<Notification, NodeError> {
        let tipo_destinatario =
            self.choice("recipientType", RecipientType::All, "one of \"all\", \"user\", \"role\"")?;
        let destinatario_id = match tipo_destinatario {
            RecipientType::All => None,
            RecipientType::User | RecipientType::Role => self.optional("recipientId")?,
        };

        Ok(Notification {
            titulo: self.required("notificationTitle")?,
            mensagem: self.required("notificationMessage")?,
            tipo_destinatario,
            destinatario_id,
        })
    }
}

impl Operation {
    /// Build the typed operation from an item's parameters.
    ///
    /// # Errors
    /// [`NodeError::MissingField`] for the first absent required field, checked
    /// before anything else is read; [`NodeError::InvalidField`] for values of
    /// the wrong shape.
    pub fn from_parameters(
        spec: &'static OperationSpec,
        params: &Map<String, Value>,
    ) -> Result<Self, NodeError> {
        if let Some(field) = spec.missing_field(params) {
            return Err(NodeError::MissingField { operation: spec.id, field });
        }

        let f = Fields { operation: spec.id, params };

        let op = match spec.kind {
            K::CreateBroker => Operation::CreateBroker(f.broker()?),
            K::GetBroker => Operation::GetBroker { broker_id: f.required("brokerId")? },
            K::ListBrokers => Operation::ListBrokers,
            K::UpdateBroker => Operation::UpdateBroker {
                broker_id: f.required("brokerId")?,
                broker: f.broker()?,
            },
            K::ListProfiles => Operation::ListProfiles,
            K::GetProfileDetails => Operation::GetProfileDetails { profile_id: f.required("profileId")? },
            K::ListManagers => Operation::ListManagers,
            K::CreateUser => Operation::CreateUser(f.user(Some(f.required("senha")?))?),
            K::UpdateUser => Operation::UpdateUser {
                user_id: f.required("userId")?,
                user: f.user(None)?,
            },
            K::GetUserData => Operation::GetUserData { user_id: f.required("userId")? },
            K::ListUsersSimplified => Operation::ListUsersSimplified,
            K::CreateFgtsProposal => Operation::CreateFgtsProposal {
                broker_id: f.optional("brokerIdForProposal")?,
            },
            K::SubmitProposalToBank => Operation::SubmitProposalToBank { proposal_id: f.required("proposalId")? },
            K::CreateProposal => Operation::CreateProposal {
                broker_id: f.optional("brokerIdForProposal")?,
            },
            K::UploadProposalDocs => Operation::UploadProposalDocs {
                proposal_id: f.required("proposalId")?,
                document_file: f.required("documentFile")?,
                document_type: f.required("documentType")?,
            },
            K::AddBrokerObservation => Operation::AddBrokerObservation {
                proposal_id: f.required("proposalId")?,
                observation: f.required("observation")?,
            },
            K::SearchProposals => Operation::SearchProposals(ProposalSearch {
                cpf: f.optional("searchCpf")?,
                codigo: f.optional("proposalCode")?,
                nome: f.optional("clientName")?,
            }),
            K::GetProposalLogs => Operation::GetProposalLogs { proposal_id: f.required("proposalId")? },
            K::ListProposalStatus => Operation::ListProposalStatus,
            K::ListBankStatus => Operation::ListBankStatus,
            K::UpdateProposalStatus => Operation::UpdateProposalStatus {
                proposal_id: f.required("proposalId")?,
                status_id: f.required("statusId")?,
            },
            K::UpdateBankStatus => Operation::UpdateBankStatus {
                proposal_id: f.required("proposalId")?,
                status_id: f.required("statusId")?,
            },
            K::ChangeProposalPmt => Operation::ChangeProposalPmt {
                proposal_id: f.required("proposalId")?,
                pmt: f.number("pmtValue")?,
            },
            K::RemoveProposalPmt => Operation::RemoveProposalPmt { proposal_id: f.required("proposalId")? },
            K::GetBrokerObservations => Operation::GetBrokerObservations { proposal_id: f.required("proposalId")? },
            K::SetPortabilityBalance => Operation::SetPortabilityBalance {
                proposal_id: f.required("proposalId")?,
                balance: f.number("portabilityBalance")?,
            },
            K::ListCancellationTypes => Operation::ListCancellationTypes,
            K::ListProposalFiles => Operation::ListProposalFiles { proposal_id: f.required("proposalId")? },
            K::DownloadProposalFile => Operation::DownloadProposalFile {
                proposal_id: f.required("proposalId")?,
                file_id: f.required("fileId")?,
            },
            K::ListCommissionGroups => Operation::ListCommissionGroups,
            K::GetCommissionGroup => Operation::GetCommissionGroup {
                commission_group_id: f.required("commissionGroupId")?,
            },
            K::ListBanksWithOperations => Operation::ListBanksWithOperations,
            K::SearchOperationsByBank => Operation::SearchOperationsByBank { bank_id: f.required("bankId")? },
            K::ListNotifications => Operation::ListNotifications,
            K::SendNotification => Operation::SendNotification(f.notification()?),
            K::Authenticate => Operation::Authenticate,
            K::MyData => Operation::MyData,
        };

        // A dot segment would be collapsed by URL normalisation and retarget the call.
        if let Some((field, _)) = op
            .path_params()
            .into_iter()
            .find(|(_, value)| matches!(value.as_str(), "." | ".."))
        {
            return Err(f.invalid(field, "an identifier other than \".\" or \"..\""));
        }

        Ok(op)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateBroker(_) => K::CreateBroker,
            Operation::GetBroker { .. } => K::GetBroker,
            Operation::ListBrokers => K::ListBrokers,
            Operation::UpdateBroker { .. } => K::UpdateBroker,
            Operation::ListProfiles => K::ListProfiles,
            Operation::GetProfileDetails { .. } => K::GetProfileDetails,
            Operation::ListManagers => K::ListManagers,
            Operation::CreateUser(_) => K::CreateUser,
            Operation::UpdateUser { .. } => K::UpdateUser,
            Operation::GetUserData { .. } => K::GetUserData,
            Operation::ListUsersSimplified => K::ListUsersSimplified,
            Operation::CreateFgtsProposal { .. } => K::CreateFgtsProposal,
            Operation::SubmitProposalToBank { .. } => K::SubmitProposalToBank,
            Operation::CreateProposal { .. } => K::CreateProposal,
            Operation::UploadProposalDocs { .. } => K::UploadProposalDocs,
            Operation::AddBrokerObservation { .. } => K::AddBrokerObservation,
            Operation::SearchProposals(_) => K::SearchProposals,
            Operation::GetProposalLogs { .. } => K::GetProposalLogs,
            Operation::ListProposalStatus => K::ListProposalStatus,
            Operation::ListBankStatus => K::ListBankStatus,
            Operation::UpdateProposalStatus { .. } => K::UpdateProposalStatus,
            Operation::UpdateBankStatus { .. } => K::UpdateBankStatus,
            Operation::ChangeProposalPmt { .. } => K::ChangeProposalPmt,
            Operation::RemoveProposalPmt { .. } => K::RemoveProposalPmt,
            Operation::GetBrokerObservations { .. } => K::GetBrokerObservations,
            Operation::SetPortabilityBalance { .. } => K::SetPortabilityBalance,
            Operation::ListCancellationTypes => K::ListCancellationTypes,
            Operation::ListProposalFiles { .. } => K::ListProposalFiles,
            Operation::DownloadProposalFile { .. } => K::DownloadProposalFile,
            Operation::ListCommissionGroups => K::ListCommissionGroups,
            Operation::GetCommissionGroup { .. } => K::GetCommissionGroup,
            Operation::ListBanksWithOperations => K::ListBanksWithOperations,
            Operation::SearchOperationsByBank { .. } => K::SearchOperationsByBank,
            Operation::ListNotifications => K::ListNotifications,
            Operation::SendNotification(_) => K::SendNotification,
            Operation::Authenticate => K::Authenticate,
            Operation::MyData => K::MyData,
        }
    }

    pub fn spec(&self) -> &'static OperationSpec {
        self.kind().spec()
    }

    /// Values for the path template placeholders.
    fn path_params(&self) -> Vec<(&'static str, &String)> {
        match self {
            Operation::GetBroker { broker_id } | Operation::UpdateBroker { broker_id, .. } => {
                vec![("brokerId", broker_id)]
            }
            Operation::GetProfileDetails { profile_id } => vec![("profileId", profile_id)],
            Operation::UpdateUser { user_id, .. } | Operation::GetUserData { user_id } => {
                vec![("userId", user_id)]
            }
            Operation::SubmitProposalToBank { proposal_id }
            | Operation::UploadProposalDocs { proposal_id, .. }
            | Operation::AddBrokerObservation { proposal_id, .. }
            | Operation::GetProposalLogs { proposal_id }
            | Operation::UpdateProposalStatus { proposal_id, .. }
            | Operation::UpdateBankStatus { proposal_id, .. }
            | Operation::ChangeProposalPmt { proposal_id, .. }
            | Operation::RemoveProposalPmt { proposal_id }
            | Operation::GetBrokerObservations { proposal_id }
            | Operation::SetPortabilityBalance { proposal_id, .. }
            | Operation::ListProposalFiles { proposal_id } => vec![("proposalId", proposal_id)],
            Operation::DownloadProposalFile { proposal_id, file_id } => {
                vec![("proposalId", proposal_id), ("fileId", file_id)]
            }
            Operation::GetCommissionGroup { commission_group_id } => {
                vec![("commissionGroupId", commission_group_id)]
            }
            Operation::SearchOperationsByBank { bank_id } => vec![("bankId", bank_id)],
            _ => Vec::new(),
        }
    }

    fn body(&self) -> Option<Value> {
        match self {
            Operation::CreateBroker(broker) | Operation::UpdateBroker { broker, .. } => Some(json!(broker)),
            Operation::CreateUser(user) | Operation::UpdateUser { user, .. } => Some(json!(user)),
            Operation::CreateFgtsProposal { broker_id } | Operation::CreateProposal { broker_id } => {
                Some(match broker_id {
                    Some(id) => json!({ "corretor": id }),
                    None => json!({}),
                })
            }
            Operation::UploadProposalDocs { document_file, document_type, .. } => {
                Some(json!({ "arquivo": document_file, "tipo": document_type }))
            }
            Operation::AddBrokerObservation { observation, .. } => Some(json!({ "observacao": observation })),
            Operation::UpdateProposalStatus { status_id, .. } | Operation::UpdateBankStatus { status_id, .. } => {
                Some(json!({ "status": status_id }))
            }
            Operation::ChangeProposalPmt { pmt, .. } => Some(json!({ "pmt": pmt })),
            Operation::SetPortabilityBalance { balance, .. } => Some(json!({ "saldo": balance })),
            Operation::SendNotification(notification) => Some(json!(notification)),
            _ => None,
        }
    }

    fn query(&self) -> Vec<(String, String)> {
        match self {
            Operation::SearchProposals(search) => search.query(),
            _ => Vec::new(),
        }
    }

    /// The HTTP request this operation issues, or `None` when it has no endpoint.
    pub fn request(&self) -> Option<RequestSpec> {
        let endpoint = self.spec().endpoint?;
        let params = self.path_params();

        let path = endpoint
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .and_then(|name| params.iter().find(|(key, _)| *key == name))
                    .map(|(_, value)| (*value).to_owned())
                    .unwrap_or_else(|| segment.to_owned())
            })
            .collect();

        Some(RequestSpec {
            method: endpoint.method,
            path,
            query: self.query(),
            body: self.body(),
        })
    }
}

// ---------------------------------------------------------------------------
// RequestSpec
// ---------------------------------------------------------------------------

/// A fully-built request, independent of any HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Decoded path segments; encoding happens in [`RequestSpec::url`].
    pub path: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.split('/').filter(|s| !s.is_empty()).map(str::to_owned).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolve against `base_url`, percent-encoding each path segment.
    pub fn url(&self, base_url: &str) -> Result<Url, NodeError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| NodeError::InvalidCredentials(format!("base URL '{base_url}': {e}")))?;

        url.path_segments_mut()
            .map_err(|_| NodeError::InvalidCredentials(format!("base URL '{base_url}' cannot carry a path")))?
            .pop_if_empty()
            .extend(&self.path);

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}
