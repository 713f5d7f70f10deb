//! sea-query statements over a per-form table
//!
//! Translates the domain query AST into backend-specific SQL. Identifiers are
//! always `Alias`es and values are always bound.

use crate::contract::{
    FormId, SubmissionId, IS_FINALIZED, LAST_MODIFIED_DATE, SUBMISSION_DATE, SUBMISSION_ID,
};
use crate::domain::query::{
    ColumnCast, ColumnTarget, Comparison, OrderTerm, Predicate, PredicateValue, SortDirection,
    SubmissionQuery,
};
use crate::domain::repository::ColumnValues;
use anyhow::Result;
use sea_orm::sea_query::{
    Alias, Condition, DeleteStatement, Expr, Func, InsertStatement, Order, Query,
    SelectStatement, SimpleExpr, UpdateStatement,
};
use sea_orm::DbBackend;

use super::mapper::to_db_value;

/// Alias of the aggregate column read back from count queries
pub const COUNT_ALIAS: &str = "num_rows";
/// Alias of the aggregate column read back from earliest-date queries
pub const EARLIEST_ALIAS: &str = "first_date";

/// Backend-dependent spelling of the casts the query builder asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    MySql,
    Postgres,
    Sqlite,
}

impl From<DbBackend> for SqlDialect {
    fn from(backend: DbBackend) -> Self {
        match backend {
            DbBackend::MySql => Self::MySql,
            DbBackend::Postgres => Self::Postgres,
            DbBackend::Sqlite => Self::Sqlite,
        }
    }
}

impl SqlDialect {
    /// Target type for a cast; `None` leaves the column as stored.
    /// SQLite keeps datetimes as ISO text, which already sorts chronologically.
    fn cast_type(self, cast: ColumnCast) -> Option<&'static str> {
        match (self, cast) {
            (Self::MySql, ColumnCast::DateTime) => Some("DATETIME"),
            (Self::MySql, ColumnCast::SignedInteger) => Some("SIGNED"),
            (Self::Postgres, ColumnCast::DateTime) => Some("TIMESTAMP"),
            (Self::Postgres, ColumnCast::SignedInteger) => Some("BIGINT"),
            (Self::Sqlite, ColumnCast::DateTime) => None,
            (Self::Sqlite, ColumnCast::SignedInteger) => Some("INTEGER"),
        }
    }

    /// Casts only ever apply to custom text columns. Postgres rejects `''` as
    /// a number or timestamp, so blanks become NULL there first.
    fn target(self, target: &ColumnTarget) -> SimpleExpr {
        let column = Expr::col(Alias::new(target.column.as_str()));
        match target.cast.and_then(|cast| self.cast_type(cast)) {
            Some(ty) if self == Self::Postgres => Func::cast_as(
                Func::cust(Alias::new("NULLIF")).arg(column).arg(""),
                Alias::new(ty),
            )
            .into(),
            Some(ty) => Func::cast_as(column, Alias::new(ty)).into(),
            None => column.into(),
        }
    }

    /// Left side of a LIKE. Postgres has no LIKE for timestamps or integers.
    fn like_target(self, target: &ColumnTarget) -> SimpleExpr {
        if self == Self::Postgres && target.cast.is_none() && is_typed_column(&target.column) {
            return Func::cast_as(Expr::col(Alias::new(target.column.as_str())), Alias::new("TEXT"))
                .into();
        }
        self.target(target)
    }

    /// WHERE condition for a predicate tree
    pub fn condition(self, predicate: &Predicate) -> Condition {
        let expr = match predicate {
            Predicate::Any(parts) => {
                return parts
                    .iter()
                    .fold(Condition::any(), |cond, part| cond.add(self.condition(part)))
            }
            Predicate::All(parts) => {
                return parts
                    .iter()
                    .fold(Condition::all(), |cond, part| cond.add(self.condition(part)))
            }
            Predicate::Finalized => Expr::col(Alias::new(IS_FINALIZED)).eq("yes"),
            Predicate::IdEquals(id) => Expr::col(Alias::new(SUBMISSION_ID)).eq(*id),
            Predicate::Like { target, pattern } => {
                Expr::expr(self.like_target(target)).like(pattern.as_str())
            }
            Predicate::NotLike { target, pattern } => {
                Expr::expr(self.like_target(target)).not_like(pattern.as_str())
            }
            Predicate::Compare { target, op, value } => {
                let lhs = Expr::expr(self.target(target));
                let value: sea_orm::Value = match value {
                    PredicateValue::Text(text) => text.clone().into(),
                    PredicateValue::DateTime(at) => (*at).into(),
                };
                match op {
                    Comparison::Eq => lhs.eq(value),
                    Comparison::NotEq => lhs.ne(value),
                    Comparison::Gt => lhs.gt(value),
                    Comparison::Gte => lhs.gte(value),
                    Comparison::Lt => lhs.lt(value),
                    Comparison::Lte => lhs.lte(value),
                }
            }
        };
        Condition::all().add(expr)
    }

    fn order(self, stmt: &mut SelectStatement, terms: &[OrderTerm]) {
        for term in terms {
            let direction = match term.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            stmt.order_by_expr(self.target(&term.target), direction);
        }
    }

    // ===== Statements =====

    pub fn select(self, form_id: FormId, query: &SubmissionQuery) -> SelectStatement {
        let mut stmt = Query::select();
        stmt.from(table(form_id))
            .columns(query.columns.iter().map(|c| Alias::new(c.as_str())))
            .cond_where(self.condition(&query.predicate));
        self.order(&mut stmt, &query.order);
        if let Some(window) = query.window {
            stmt.limit(window.limit).offset(window.offset);
        }
        stmt
    }

    pub fn count(self, form_id: FormId, predicate: &Predicate) -> SelectStatement {
        Query::select()
            .expr_as(
                Func::count(Expr::col(Alias::new(SUBMISSION_ID))),
                Alias::new(COUNT_ALIAS),
            )
            .from(table(form_id))
            .cond_where(self.condition(predicate))
            .to_owned()
    }

    pub fn earliest_submission_date(self, form_id: FormId, predicate: &Predicate) -> SelectStatement {
        Query::select()
            .expr_as(
                Func::min(Expr::col(Alias::new(SUBMISSION_DATE))),
                Alias::new(EARLIEST_ALIAS),
            )
            .from(table(form_id))
            .cond_where(self.condition(predicate))
            .to_owned()
    }

    /// Postgres reads the new id back with RETURNING; the others use the
    /// driver's last insert id.
    pub fn insert(self, form_id: FormId, values: &ColumnValues) -> Result<InsertStatement> {
        let mut stmt = Query::insert();
        stmt.into_table(table(form_id))
            .columns(values.keys().map(|c| Alias::new(c.as_str())))
            .values(values.values().map(|v| SimpleExpr::from(to_db_value(v))))?;
        if self == Self::Postgres {
            stmt.returning_col(Alias::new(SUBMISSION_ID));
        }
        Ok(stmt)
    }

    pub fn update(
        self,
        form_id: FormId,
        submission_id: SubmissionId,
        values: &ColumnValues,
    ) -> UpdateStatement {
        Query::update()
            .table(table(form_id))
            .values(
                values
                    .iter()
                    .map(|(column, value)| (Alias::new(column.as_str()), SimpleExpr::from(to_db_value(value)))),
            )
            .and_where(Expr::col(Alias::new(SUBMISSION_ID)).eq(submission_id))
            .to_owned()
    }

    pub fn delete(self, form_id: FormId, submission_ids: &[SubmissionId]) -> DeleteStatement {
        Query::delete()
            .from_table(table(form_id))
            .and_where(Expr::col(Alias::new(SUBMISSION_ID)).is_in(submission_ids.iter().copied()))
            .to_owned()
    }
}

/// System columns stored with a non-text type
fn is_typed_column(column: &str) -> bool {
    matches!(column, SUBMISSION_ID | SUBMISSION_DATE | LAST_MODIFIED_DATE)
}

/// Per-form table name
pub fn table(form_id: FormId) -> Alias {
    Alias::new(format!("form_{form_id}"))
}
