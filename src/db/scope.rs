//! Tenant-scoped query construction.
//!
//! Every admin-facing read starts from a [`ScopedQuery`], and the only way to
//! get one is to hand over a [`TenantScope`]. The tenant predicate is written
//! into the `WHERE` clause by the constructor, so callers can add filters but
//! cannot forget the scope.

use crate::models::TenantScope;
use sqlx::{Encode, Postgres, QueryBuilder, Type};

pub struct ScopedQuery<'a> {
    builder: QueryBuilder<'a, Postgres>,
}

impl<'a> ScopedQuery<'a> {
    /// `SELECT {columns} FROM devices d WHERE <scope>`
    pub fn devices(scope: &TenantScope, columns: &str) -> Self {
        let builder = QueryBuilder::new(format!("SELECT {} FROM devices d", columns));
        Self::with_scope(builder, scope)
    }

    /// `SELECT {columns} FROM {from} JOIN devices d ON d.id = {device_column} WHERE <scope>`
    pub fn joined(scope: &TenantScope, columns: &str, from: &str, device_column: &str) -> Self {
        let builder = QueryBuilder::new(format!(
            "SELECT {} FROM {} JOIN devices d ON d.id = {}",
            columns, from, device_column
        ));
        Self::with_scope(builder, scope)
    }

    fn with_scope(mut builder: QueryBuilder<'a, Postgres>, scope: &TenantScope) -> Self {
        builder.push(" WHERE ");
        match scope {
            TenantScope::All => {
                builder.push("TRUE");
            }
            TenantScope::Tenants(ids) => {
                builder.push("d.tenant_id = ANY(");
                builder.push_bind(ids.clone());
                builder.push(")");
            }
        }
        Self { builder }
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.builder.push(sql);
        self
    }

    pub fn push_bind<T>(&mut self, value: T) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres>,
    {
        self.builder.push_bind(value);
        self
    }

    /// Appends `AND {column} = $n`.
    pub fn and_eq<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres>,
    {
        self.builder.push(" AND ").push(column).push(" = ");
        self.builder.push_bind(value);
        self
    }

    /// Appends `ORDER BY {order} LIMIT $n OFFSET $m`.
    pub fn paginate(&mut self, order: &str, limit: i64, offset: i64) -> &mut Self {
        self.builder.push(" ORDER BY ").push(order).push(" LIMIT ");
        self.builder.push_bind(limit);
        self.builder.push(" OFFSET ");
        self.builder.push_bind(offset);
        self
    }

    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    pub fn builder(&mut self) -> &mut QueryBuilder<'a, Postgres> {
        &mut self.builder
    }
}
