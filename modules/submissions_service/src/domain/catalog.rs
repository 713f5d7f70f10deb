//! Form, view and filter metadata providers
//!
//! Form design lives outside this service. The engine only reads the metadata
//! through these traits; `InMemoryFormCatalog` backs tests and embedded setups.

use crate::contract::{
    Field, FieldId, Form, FormId, NewSubmissionDefault, View, ViewField, ViewFilter, ViewId,
};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Form and field metadata
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn form_exists(&self, form_id: FormId) -> Result<bool>;

    async fn get_form(&self, form_id: FormId) -> Result<Option<Form>>;

    /// Every field of the form, system fields included, in list order
    async fn get_form_fields(&self, form_id: FormId) -> Result<Vec<Field>>;
}

/// Per-view field settings
#[async_trait]
pub trait ViewProvider: Send + Sync {
    /// The view's fields in display order
    async fn get_view_fields(&self, view_id: ViewId) -> Result<Vec<ViewField>>;

    async fn get_view_field(&self, view_id: ViewId, field_id: FieldId) -> Result<Option<ViewField>>;

    /// Values assigned to new rows created through this view
    async fn get_new_submission_defaults(&self, view_id: ViewId)
        -> Result<Vec<NewSubmissionDefault>>;

    /// Fields the view allows searching on
    async fn get_searchable_fields(&self, view_id: ViewId) -> Result<Vec<FieldId>>;
}

/// Storage-level row filters configured on views
#[async_trait]
pub trait FilterProvider: Send + Sync {
    async fn get_view_filters(&self, view_id: ViewId) -> Result<Vec<ViewFilter>>;
}

/// Everything the engine reads about form design
pub trait FormCatalog: SchemaProvider + ViewProvider + FilterProvider {}

impl<T: SchemaProvider + ViewProvider + FilterProvider> FormCatalog for T {}

#[derive(Default)]
struct CatalogState {
    forms: HashMap<FormId, Form>,
    fields: HashMap<FormId, Vec<Field>>,
    views: HashMap<ViewId, View>,
    view_fields: HashMap<ViewId, Vec<ViewField>>,
    defaults: HashMap<ViewId, Vec<NewSubmissionDefault>>,
    filters: HashMap<ViewId, Vec<ViewFilter>>,
}

/// In-memory form catalog
///
/// Stores form metadata behind a lock so it can be shared with the service and
/// still be edited afterwards.
#[derive(Clone, Default)]
pub struct InMemoryFormCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryFormCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a form together with its fields
    pub fn add_form(&self, form: Form, fields: Vec<Field>) {
        let mut state = self.state.write();
        let mut fields = fields;
        fields.sort_by_key(|f| f.list_order);
        state.fields.insert(form.form_id, fields);
        state.forms.insert(form.form_id, form);
    }

    pub fn remove_form(&self, form_id: FormId) {
        let mut state = self.state.write();
        state.forms.remove(&form_id);
        state.fields.remove(&form_id);
    }

    /// Register or replace a view with its field settings
    pub fn add_view(&self, view: View, view_fields: Vec<ViewField>) {
        let mut state = self.state.write();
        let mut view_fields = view_fields;
        view_fields.sort_by_key(|vf| vf.list_order);
        state.view_fields.insert(view.view_id, view_fields);
        state.views.insert(view.view_id, view);
    }

    pub fn set_new_submission_defaults(&self, view_id: ViewId, defaults: Vec<NewSubmissionDefault>) {
        self.state.write().defaults.insert(view_id, defaults);
    }

    pub fn set_view_filters(&self, view_id: ViewId, filters: Vec<ViewFilter>) {
        self.state.write().filters.insert(view_id, filters);
    }

    pub fn form_count(&self) -> usize {
        self.state.read().forms.len()
    }
}

#[async_trait]
impl SchemaProvider for InMemoryFormCatalog {
    async fn form_exists(&self, form_id: FormId) -> Result<bool> {
        Ok(self.state.read().forms.contains_key(&form_id))
    }

    async fn get_form(&self, form_id: FormId) -> Result<Option<Form>> {
        Ok(self.state.read().forms.get(&form_id).cloned())
    }

    async fn get_form_fields(&self, form_id: FormId) -> Result<Vec<Field>> {
        Ok(self.state.read().fields.get(&form_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ViewProvider for InMemoryFormCatalog {
    async fn get_view_fields(&self, view_id: ViewId) -> Result<Vec<ViewField>> {
        Ok(self.state.read().view_fields.get(&view_id).cloned().unwrap_or_default())
    }

    async fn get_view_field(&self, view_id: ViewId, field_id: FieldId) -> Result<Option<ViewField>> {
        Ok(self
            .state
            .read()
            .view_fields
            .get(&view_id)
            .and_then(|fields| fields.iter().find(|vf| vf.field_id == field_id).cloned()))
    }

    async fn get_new_submission_defaults(
        &self,
        view_id: ViewId,
    ) -> Result<Vec<NewSubmissionDefault>> {
        Ok(self.state.read().defaults.get(&view_id).cloned().unwrap_or_default())
    }

    async fn get_searchable_fields(&self, view_id: ViewId) -> Result<Vec<FieldId>> {
        Ok(self
            .state
            .read()
            .view_fields
            .get(&view_id)
            .map(|fields| {
                fields
                    .iter()
                    .filter(|vf| vf.is_searchable)
                    .map(|vf| vf.field_id)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl FilterProvider for InMemoryFormCatalog {
    async fn get_view_filters(&self, view_id: ViewId) -> Result<Vec<ViewFilter>> {
        Ok(self.state.read().filters.get(&view_id).cloned().unwrap_or_default())
    }
}
