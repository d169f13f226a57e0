//! Value binding and row conversion for PostgreSQL.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tokio_postgres::types::{ToSql, Type};
use uuid::Uuid;

use strata_core::{DataRow, DbType, DbValue, HostType, ParameterCollection};

use crate::error::PgResult;

/// Box a value for use as a PostgreSQL parameter.
///
/// Nulls are boxed with the host type of the column's logical type so the
/// driver can report a concrete parameter type to the server.
pub fn bind_value(value: &DbValue, db_type: DbType) -> Box<dyn ToSql + Sync + Send> {
    match value {
        DbValue::Null => null_binding(db_type),
        DbValue::String(v) => Box::new(v.clone()),
        DbValue::I16(v) => Box::new(*v),
        DbValue::I32(v) => Box::new(*v),
        DbValue::I64(v) => Box::new(*v),
        DbValue::F64(v) => Box::new(*v),
        DbValue::Decimal(v) => Box::new(*v),
        DbValue::Bool(v) => Box::new(*v),
        DbValue::DateTime(v) => Box::new(*v),
        DbValue::Uuid(v) => Box::new(*v),
        DbValue::Bytes(v) => Box::new(v.clone()),
    }
}

fn null_binding(db_type: DbType) -> Box<dyn ToSql + Sync + Send> {
    match db_type.host_type() {
        HostType::String | HostType::Time | HostType::Variant => Box::new(Option::<String>::None),
        HostType::I16 => Box::new(Option::<i16>::None),
        HostType::I32 => Box::new(Option::<i32>::None),
        HostType::I64 => Box::new(Option::<i64>::None),
        HostType::F64 => Box::new(Option::<f64>::None),
        HostType::Decimal => Box::new(Option::<Decimal>::None),
        HostType::Bool => Box::new(Option::<bool>::None),
        HostType::DateTime => Box::new(Option::<NaiveDateTime>::None),
        HostType::Uuid => Box::new(Option::<Uuid>::None),
        HostType::Bytes => Box::new(Option::<Vec<u8>>::None),
    }
}

/// Box the input parameters of a collection, in collection order.
pub fn bind_parameters(parameters: &ParameterCollection) -> Vec<Box<dyn ToSql + Sync + Send>> {
    parameters
        .inputs()
        .map(|p| bind_value(&p.value, p.db_type))
        .collect()
}

/// Convert a driver row into a backend-neutral [`DataRow`].
pub fn row_to_data_row(row: &Row) -> PgResult<DataRow> {
    let columns: Vec<String> = row
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let mut values = Vec::with_capacity(columns.len());
    for (index, column) in row.columns().iter().enumerate() {
        values.push(column_value(row, index, column.type_())?);
    }
    Ok(DataRow::new(columns, values))
}

fn column_value(row: &Row, index: usize, ty: &Type) -> PgResult<DbValue> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(index)?.map(DbValue::Bool),
        Type::INT2 => row.try_get::<_, Option<i16>>(index)?.map(DbValue::I16),
        Type::INT4 => row.try_get::<_, Option<i32>>(index)?.map(DbValue::I32),
        Type::INT8 => row.try_get::<_, Option<i64>>(index)?.map(DbValue::I64),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)?
            .map(|v| DbValue::F64(f64::from(v))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index)?.map(DbValue::F64),
        Type::NUMERIC => row
            .try_get::<_, Option<Decimal>>(index)?
            .map(DbValue::Decimal),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(index)?
            .map(DbValue::String),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(index)?
            .map(DbValue::Bytes),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(index)?
            .map(DbValue::DateTime),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(index)?
            .map(|v| DbValue::DateTime(v.naive_utc())),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(index)?
            .map(|v| DbValue::DateTime(v.and_time(NaiveTime::MIN))),
        Type::UUID => row.try_get::<_, Option<Uuid>>(index)?.map(DbValue::Uuid),
        // information_schema domains and other exotic types: fall back to
        // text, and to null when the value has no text form
        _ => row
            .try_get::<_, Option<String>>(index)
            .ok()
            .flatten()
            .map(DbValue::String),
    };
    Ok(value.unwrap_or(DbValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_value_accepts_every_value_kind() {
        let values = [
            DbValue::String("x".into()),
            DbValue::I16(1),
            DbValue::I32(2),
            DbValue::I64(3),
            DbValue::F64(1.5),
            DbValue::Decimal(Decimal::new(125, 2)),
            DbValue::Bool(true),
            DbValue::Uuid(Uuid::nil()),
            DbValue::Bytes(vec![1, 2, 3]),
        ];
        for value in values {
            let _ = bind_value(&value, DbType::VarChar);
        }
        // typed nulls exist for every logical type
        for db_type in DbType::ALL {
            let _ = bind_value(&DbValue::Null, db_type);
        }
    }

    #[test]
    fn test_bind_parameters_skips_directional() {
        use strata_core::Parameter;

        let mut params = ParameterCollection::new();
        params.push(Parameter::input("A", DbType::Int32, 1.into()));
        params.push(Parameter::output("B", DbType::Int32));
        assert_eq!(bind_parameters(&params).len(), 1);
    }
}
