//! Search, counting and aggregate stats over a form's submissions

use super::query::{self, Predicate, SubmissionQuery};
use super::service::{form_columns, Service};
use crate::contract::{
    ColumnSet, FieldId, FormId, MappedOption, SearchRequest, SearchResults, SearchSpec,
    SubmissionId, SubmissionStats, SubmissionsError, ViewId, SUBMISSION_ID,
};
use tracing::{debug, warn};

impl Service {
    /// One page of finalized rows matching the search, with match and view totals
    pub async fn search_submissions(
        &self,
        form_id: FormId,
        view_id: ViewId,
        request: &SearchRequest,
    ) -> Result<SearchResults, SubmissionsError> {
        let fields = self.form_fields(form_id).await?;
        let filter = self.view_filter_predicate(view_id).await?;

        let searchable = match &request.searchable_columns {
            Some(ColumnSet::Only(columns)) if columns.is_empty() => request.columns.clone(),
            Some(columns) => columns.clone(),
            None => request.columns.clone(),
        };
        let search = query::search_where(
            &fields,
            &request.search,
            &searchable,
            self.config.search_date_format,
        );
        let predicate = query::compose(
            search,
            filter.clone(),
            query::submission_id_allowlist(&request.submission_ids),
        );

        let page = SubmissionQuery {
            columns: query::select_columns(&request.columns, &form_columns(&fields)),
            predicate: predicate.clone(),
            order: query::order_by(&fields, &request.order),
            window: query::page_window(&request.pagination),
        };

        let rows = self
            .repo
            .select(form_id, &page)
            .await
            .map_err(|e| SubmissionsError::storage("search_submissions", e))?;
        let search_num_results = self
            .repo
            .count(form_id, &predicate)
            .await
            .map_err(|e| SubmissionsError::storage("search_submissions", e))?;
        let view_num_results = self
            .repo
            .count(form_id, &query::compose(None, filter, None))
            .await
            .map_err(|e| SubmissionsError::storage("search_submissions", e))?;

        debug!(
            form_id,
            view_id,
            rows = rows.len(),
            search_num_results,
            view_num_results,
            "Searched submissions"
        );
        Ok(SearchResults {
            rows,
            search_num_results,
            view_num_results,
        })
    }

    /// Every finalized id matching the search and view filters, in `order`
    pub async fn get_search_submission_ids(
        &self,
        form_id: FormId,
        view_id: ViewId,
        order: &str,
        search: &SearchSpec,
        searchable_columns: &ColumnSet,
    ) -> Result<Vec<SubmissionId>, SubmissionsError> {
        let fields = self.form_fields(form_id).await?;
        let filter = self.view_filter_predicate(view_id).await?;
        let search = query::search_where(
            &fields,
            search,
            searchable_columns,
            self.config.search_date_format,
        );

        let ids = SubmissionQuery {
            columns: vec![SUBMISSION_ID.to_string()],
            predicate: query::compose(search, filter, None),
            order: query::order_by(&fields, order),
            window: None,
        };
        let rows = self
            .repo
            .select(form_id, &ids)
            .await
            .map_err(|e| SubmissionsError::storage("get_search_submission_ids", e))?;

        Ok(rows.iter().filter_map(|row| row.id()).collect())
    }

    /// Finalized rows, narrowed by the view's filters when a view is given
    pub async fn get_submission_count(
        &self,
        form_id: FormId,
        view_id: Option<ViewId>,
    ) -> Result<u64, SubmissionsError> {
        let filter = match view_id {
            Some(view_id) => self.view_filter_predicate(view_id).await?,
            None => None,
        };
        self.repo
            .count(form_id, &query::compose(None, filter, None))
            .await
            .map_err(|e| SubmissionsError::storage("get_submission_count", e))
    }

    /// Whether the row passes the view's filters. A view without filters contains
    /// every row; a failing probe reports `false`.
    pub async fn check_view_contains_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        submission_id: SubmissionId,
    ) -> bool {
        let filter = match self.view_filter_predicate(view_id).await {
            Ok(Some(filter)) => filter,
            Ok(None) => return true,
            Err(e) => {
                warn!(form_id, view_id, submission_id, "View filter lookup failed: {}", e);
                return false;
            }
        };

        let predicate = Predicate::All(vec![Predicate::IdEquals(submission_id), filter]);
        match self.repo.count(form_id, &predicate).await {
            Ok(count) => count > 0,
            Err(e) => {
                warn!(form_id, view_id, submission_id, "View membership probe failed: {}", e);
                false
            }
        }
    }

    /// `{submission_id, value}` pairs of one column, sorted by that column
    pub async fn get_mapped_field_options(
        &self,
        form_id: FormId,
        field_id: FieldId,
        order: &str,
    ) -> Result<Vec<MappedOption>, SubmissionsError> {
        let fields = self.form_fields(form_id).await?;
        let field = fields
            .iter()
            .find(|f| f.field_id == field_id)
            .ok_or_else(|| SubmissionsError::NotFound {
                resource: "field".to_string(),
                id: field_id.to_string(),
            })?;
        let column = field.column_name.clone();

        let options = SubmissionQuery {
            columns: query::select_columns(&ColumnSet::Only(vec![column.clone()]), &[]),
            predicate: query::finalized_only(),
            order: query::order_by(&fields, &format!("{column}-{order}")),
            window: None,
        };
        let rows = self
            .repo
            .select(form_id, &options)
            .await
            .map_err(|e| SubmissionsError::storage("get_mapped_field_options", e))?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(MappedOption {
                    value: row.id()?,
                    name: row.get(&column).and_then(|v| v.as_text()).unwrap_or_default(),
                })
            })
            .collect())
    }

    /// Recompute and cache form stats, and view stats when a view is given.
    /// Failures are logged; stale stats never fail the calling operation.
    pub async fn refresh_stats(&self, form_id: FormId, view_id: Option<ViewId>) {
        match self.compute_stats(form_id, None).await {
            Ok(stats) => {
                if let Err(e) = self.collaborators.stats.cache_form_stats(form_id, stats).await {
                    warn!(form_id, "Failed to cache form stats: {}", e);
                }
            }
            Err(e) => warn!(form_id, "Failed to compute form stats: {}", e),
        }

        let Some(view_id) = view_id else {
            return;
        };
        let filter = match self.view_filter_predicate(view_id).await {
            Ok(filter) => filter,
            Err(e) => {
                warn!(form_id, view_id, "Failed to load view filters for stats: {}", e);
                return;
            }
        };
        match self.compute_stats(form_id, filter).await {
            Ok(stats) => {
                if let Err(e) = self
                    .collaborators
                    .stats
                    .cache_view_stats(form_id, view_id, stats)
                    .await
                {
                    warn!(form_id, view_id, "Failed to cache view stats: {}", e);
                }
            }
            Err(e) => warn!(form_id, view_id, "Failed to compute view stats: {}", e),
        }
    }

    async fn compute_stats(
        &self,
        form_id: FormId,
        filter: Option<Predicate>,
    ) -> anyhow::Result<SubmissionStats> {
        let predicate = query::compose(None, filter, None);
        Ok(SubmissionStats {
            submission_count: self.repo.count(form_id, &predicate).await?,
            first_submission_date: self
                .repo
                .earliest_submission_date(form_id, &predicate)
                .await?,
        })
    }

    pub(super) async fn view_filter_predicate(
        &self,
        view_id: ViewId,
    ) -> Result<Option<Predicate>, SubmissionsError> {
        let filters = self
            .catalog
            .get_view_filters(view_id)
            .await
            .map_err(|e| SubmissionsError::storage("get_view_filters", e))?;
        Ok(query::view_filter(&filters))
    }
}
