//! Common test utilities: a provisioned in-memory database, a sample form and
//! recording mocks for every collaborator.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use submissions_service::config::Config;
use submissions_service::contract::*;
use submissions_service::domain::query::{Predicate, SubmissionQuery};
use submissions_service::domain::*;
use submissions_service::infra::storage::SeaOrmSubmissionRepository;
use submissions_service::SubmissionsModule;

pub const FORM_ID: FormId = 1;
pub const VIEW_ID: ViewId = 10;
/// View restricted to rows whose first name contains "an"
pub const FILTERED_VIEW_ID: ViewId = 11;

pub const TEXT_TYPE: FieldTypeId = 1;
pub const FILE_TYPE: FieldTypeId = 8;

pub const SUBMISSION_ID_FIELD: FieldId = 1;
pub const SUBMISSION_DATE_FIELD: FieldId = 2;
pub const LAST_MODIFIED_FIELD: FieldId = 3;
pub const IP_ADDRESS_FIELD: FieldId = 4;
pub const FIRST_NAME: FieldId = 6;
pub const AMOUNT: FieldId = 7;
pub const COLORS: FieldId = 8;
pub const BIRTHDAY: FieldId = 9;
pub const ATTACHMENT: FieldId = 10;

pub const REDIRECT_URL: &str = "https://example.com/thanks";

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

// ===== Sample form =====

pub fn sample_form() -> Form {
    Form {
        form_id: FORM_ID,
        form_name: "Contact".into(),
        is_complete: true,
        is_active: true,
        redirect_url: Some(REDIRECT_URL.into()),
        strip_tags_on_submit: false,
        auto_delete_files_on_submission_delete: true,
    }
}

fn field(
    field_id: FieldId,
    column: &str,
    data_type: FieldDataType,
    field_type_id: FieldTypeId,
) -> Field {
    Field {
        field_id,
        form_id: FORM_ID,
        field_name: column.into(),
        column_name: column.into(),
        field_title: column.replace('_', " "),
        field_type_id,
        field_size: "medium".into(),
        data_type,
        list_order: field_id as u32,
        is_system_field: is_system_column(column),
        is_file_field: false,
        is_date_field: false,
        include_on_redirect: false,
        settings: Default::default(),
    }
}

/// System fields plus first_name, amount (number), colors, birthday (date)
/// and attachment (file)
pub fn sample_fields() -> Vec<Field> {
    let mut submission_date = field(SUBMISSION_DATE_FIELD, SUBMISSION_DATE, FieldDataType::Date, TEXT_TYPE);
    submission_date.is_date_field = true;
    let mut last_modified = field(LAST_MODIFIED_FIELD, LAST_MODIFIED_DATE, FieldDataType::Date, TEXT_TYPE);
    last_modified.is_date_field = true;
    let mut birthday = field(BIRTHDAY, "birthday", FieldDataType::Date, TEXT_TYPE);
    birthday.is_date_field = true;
    let mut first_name = field(FIRST_NAME, "first_name", FieldDataType::String, TEXT_TYPE);
    first_name.include_on_redirect = true;
    let mut submission_id = field(SUBMISSION_ID_FIELD, SUBMISSION_ID, FieldDataType::Number, TEXT_TYPE);
    submission_id.include_on_redirect = true;

    vec![
        submission_id,
        submission_date,
        last_modified,
        field(IP_ADDRESS_FIELD, IP_ADDRESS, FieldDataType::String, TEXT_TYPE),
        field(5, IS_FINALIZED, FieldDataType::String, TEXT_TYPE),
        first_name,
        field(AMOUNT, "amount", FieldDataType::Number, TEXT_TYPE),
        field(COLORS, "colors", FieldDataType::String, TEXT_TYPE),
        birthday,
        field(ATTACHMENT, "attachment", FieldDataType::String, FILE_TYPE),
    ]
}

fn view_field(view_id: ViewId, field_id: FieldId, list_order: u32) -> ViewField {
    ViewField {
        view_id,
        field_id,
        list_order,
        is_editable: true,
        is_searchable: matches!(field_id, FIRST_NAME | COLORS),
        is_sortable: true,
        title_override: None,
    }
}

pub fn sample_catalog() -> InMemoryFormCatalog {
    let catalog = InMemoryFormCatalog::new();
    catalog.add_form(sample_form(), sample_fields());

    let mut renamed = view_field(VIEW_ID, FIRST_NAME, 1);
    renamed.title_override = Some("Given name".into());
    catalog.add_view(
        View {
            view_id: VIEW_ID,
            form_id: FORM_ID,
            view_name: "All submissions".into(),
        },
        vec![renamed, view_field(VIEW_ID, COLORS, 2), view_field(VIEW_ID, AMOUNT, 3)],
    );

    catalog.add_view(
        View {
            view_id: FILTERED_VIEW_ID,
            form_id: FORM_ID,
            view_name: "Names with an".into(),
        },
        vec![view_field(FILTERED_VIEW_ID, FIRST_NAME, 1)],
    );
    catalog.set_view_filters(
        FILTERED_VIEW_ID,
        vec![ViewFilter {
            column_name: "first_name".into(),
            operator: FilterOperator::Like,
            values: vec!["an".into()],
            is_date: false,
        }],
    );
    catalog
}

// ===== Test environment =====

/// A service over a provisioned in-memory SQLite database
pub struct TestEnv {
    pub db: Arc<DatabaseConnection>,
    pub catalog: InMemoryFormCatalog,
    pub service: Arc<Service>,
    pub module: SubmissionsModule,
    pub notifier: RecordingNotifier,
    pub files: ScriptedFileStorage,
    pub uploader: RecordingUploader,
    pub stats: Arc<InMemoryStatsCache>,
    pub selection: InMemorySelectionStore,
    pub hooks: HookRegistry,
}

pub async fn connect() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // One connection, so every statement sees the same in-memory database
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Arc::new(Database::connect(options).await.unwrap())
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with(|_| {}).await
    }

    /// Build with collaborator overrides applied on top of the recording mocks
    pub async fn with(customize: impl FnOnce(&mut Collaborators)) -> Self {
        if std::env::var("RUST_LOG").is_ok() {
            submissions_service::init_tracing();
        }

        let db = connect().await;
        let catalog = sample_catalog();
        let notifier = RecordingNotifier::default();
        let files = ScriptedFileStorage::default();
        let uploader = RecordingUploader::default();
        let stats = Arc::new(InMemoryStatsCache::new());
        let selection = InMemorySelectionStore::new();
        let hooks = HookRegistry::new();

        let field_types = FieldTypeRegistry::new().with_type(
            FILE_TYPE,
            FieldTypeDefinition {
                is_file_field: true,
                ..Default::default()
            },
        );

        let mut collaborators = Collaborators {
            field_types: Arc::new(field_types),
            notifier: Arc::new(notifier.clone()),
            file_storage: Arc::new(files.clone()),
            uploader: Arc::new(uploader.clone()),
            stats: stats.clone(),
            selection: Arc::new(selection.clone()),
            hooks: hooks.clone(),
            ..Default::default()
        };
        customize(&mut collaborators);

        let module = SubmissionsModule::default();
        module
            .init(Config::default(), db.clone(), Arc::new(catalog.clone()), collaborators)
            .unwrap();
        module.provision_form(FORM_ID, &sample_fields()).await.unwrap();
        let service = module.service().unwrap();

        Self {
            db,
            catalog,
            service,
            module,
            notifier,
            files,
            uploader,
            stats,
            selection,
            hooks,
        }
    }

    pub fn repo(&self) -> SeaOrmSubmissionRepository {
        SeaOrmSubmissionRepository::new(self.db.clone())
    }

    /// Insert a row directly. `submitted` is `YYYY-MM-DD HH:MM:SS`.
    pub async fn seed(&self, values: &[(&str, &str)], finalized: bool, submitted: &str) -> SubmissionId {
        let submitted = NaiveDateTime::parse_from_str(submitted, "%Y-%m-%d %H:%M:%S").unwrap();
        let mut row = ColumnValues::new();
        row.insert(SUBMISSION_DATE.into(), SubmissionValue::DateTime(submitted));
        row.insert(LAST_MODIFIED_DATE.into(), SubmissionValue::DateTime(submitted));
        row.insert(IP_ADDRESS.into(), SubmissionValue::text("127.0.0.1"));
        row.insert(IS_FINALIZED.into(), SubmissionValue::Flag(finalized));
        for (column, value) in values {
            row.insert(column.to_string(), SubmissionValue::text(*value));
        }
        self.repo().insert(FORM_ID, &row).await.unwrap()
    }

    /// Every row id in the form table, finalized or not
    pub async fn stored_ids(&self) -> Vec<SubmissionId> {
        let query = SubmissionQuery {
            columns: vec![SUBMISSION_ID.to_string()],
            predicate: Predicate::All(Vec::new()),
            order: Vec::new(),
            window: None,
        };
        self.repo()
            .select(FORM_ID, &query)
            .await
            .unwrap()
            .iter()
            .filter_map(|row| row.id())
            .collect()
    }

    pub async fn stored_value(&self, submission_id: SubmissionId, column: &str) -> Option<SubmissionValue> {
        self.service
            .get_submission_info(FORM_ID, submission_id)
            .await
            .unwrap()
            .and_then(|row| row.get(column).cloned())
    }
}

// ===== Mocks =====

/// Records every notification; optionally fails after recording
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<SubmissionNotification>>>,
    failing: Arc<RwLock<bool>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(SubmissionEvent, SubmissionId)> {
        self.sent
            .read()
            .iter()
            .map(|n| (n.event, n.submission_id))
            .collect()
    }

    pub fn fail(&self) {
        *self.failing.write() = true;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: SubmissionNotification) -> anyhow::Result<()> {
        self.sent.write().push(notification);
        if *self.failing.read() {
            anyhow::bail!("mail server unreachable");
        }
        Ok(())
    }
}

/// Records deleted files; named files fail, or the whole call fails when unavailable
#[derive(Clone, Default)]
pub struct ScriptedFileStorage {
    deleted: Arc<RwLock<Vec<FileRef>>>,
    failing: Arc<RwLock<Vec<String>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl ScriptedFileStorage {
    pub fn fail_on(&self, filename: &str) {
        self.failing.write().push(filename.to_string());
    }

    pub fn go_offline(&self) {
        *self.unavailable.write() = true;
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.read().iter().map(|f| f.filename.clone()).collect()
    }
}

#[async_trait]
impl FileStorage for ScriptedFileStorage {
    async fn delete_files(&self, _form_id: FormId, files: &[FileRef]) -> anyhow::Result<Vec<FileProblem>> {
        if *self.unavailable.read() {
            anyhow::bail!("storage offline");
        }
        let failing = self.failing.read().clone();
        let mut problems = Vec::new();
        for file in files {
            if failing.contains(&file.filename) {
                problems.push(FileProblem {
                    filename: file.filename.clone(),
                    error: "permission denied".into(),
                });
            } else {
                self.deleted.write().push(file.clone());
            }
        }
        Ok(problems)
    }
}

/// Records upload calls and answers with a configurable outcome
#[derive(Clone)]
pub struct RecordingUploader {
    calls: Arc<RwLock<Vec<(SubmissionId, Vec<FieldId>)>>>,
    outcome: Arc<RwLock<UploadOutcome>>,
}

impl Default for RecordingUploader {
    fn default() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            outcome: Arc::new(RwLock::new(UploadOutcome::ok())),
        }
    }
}

impl RecordingUploader {
    pub fn answer_with(&self, outcome: UploadOutcome) {
        *self.outcome.write() = outcome;
    }

    pub fn calls(&self) -> Vec<(SubmissionId, Vec<FieldId>)> {
        self.calls.read().clone()
    }
}

#[async_trait]
impl FileUploader for RecordingUploader {
    async fn upload(
        &self,
        _form_id: FormId,
        submission_id: SubmissionId,
        fields: &[DeferredFileField],
        _payload: &FormPayload,
    ) -> anyhow::Result<UploadOutcome> {
        self.calls
            .write()
            .push((submission_id, fields.iter().map(|f| f.field.field_id).collect()));
        Ok(self.outcome.read().clone())
    }
}

/// Delegates reads, refuses every update
pub struct RefusingUpdates {
    pub inner: Arc<dyn SubmissionRepository>,
}

#[async_trait]
impl SubmissionRepository for RefusingUpdates {
    async fn select(&self, form_id: FormId, query: &SubmissionQuery) -> anyhow::Result<Vec<Submission>> {
        self.inner.select(form_id, query).await
    }

    async fn count(&self, form_id: FormId, predicate: &Predicate) -> anyhow::Result<u64> {
        self.inner.count(form_id, predicate).await
    }

    async fn earliest_submission_date(
        &self,
        form_id: FormId,
        predicate: &Predicate,
    ) -> anyhow::Result<Option<NaiveDateTime>> {
        self.inner.earliest_submission_date(form_id, predicate).await
    }

    async fn insert(&self, form_id: FormId, values: &ColumnValues) -> anyhow::Result<SubmissionId> {
        self.inner.insert(form_id, values).await
    }

    async fn update(
        &self,
        _form_id: FormId,
        _submission_id: SubmissionId,
        _values: &ColumnValues,
    ) -> anyhow::Result<()> {
        anyhow::bail!("database is locked")
    }

    async fn delete(&self, form_id: FormId, submission_ids: &[SubmissionId]) -> anyhow::Result<u64> {
        self.inner.delete(form_id, submission_ids).await
    }

    async fn exists(&self, form_id: FormId, submission_id: SubmissionId) -> anyhow::Result<bool> {
        self.inner.exists(form_id, submission_id).await
    }
}

/// Bot check with a fixed answer
pub struct StaticBotCheck {
    pub verification: Verification,
}

#[async_trait]
impl BotCheck for StaticBotCheck {
    async fn verify(&self, _token: &str, _context: &RequestContext) -> anyhow::Result<Verification> {
        Ok(self.verification.clone())
    }
}
