//! Value binding and row conversion for Microsoft SQL Server.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tiberius::{ColumnType, Row, ToSql};
use uuid::Uuid;

use strata_core::{DataRow, DbType, DbValue, HostType, ParameterCollection};

use crate::error::MssqlResult;

/// Box a value for use as a SQL Server parameter.
///
/// Nulls are boxed with the host type of the column's logical type so the
/// driver sends a typed null.
pub fn bind_value(value: &DbValue, db_type: DbType) -> Box<dyn ToSql> {
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

fn null_binding(db_type: DbType) -> Box<dyn ToSql> {
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
pub fn bind_parameters(parameters: &ParameterCollection) -> Vec<Box<dyn ToSql>> {
    parameters
        .inputs()
        .map(|p| bind_value(&p.value, p.db_type))
        .collect()
}

/// Convert a driver row into a backend-neutral [`DataRow`].
pub fn row_to_data_row(row: &Row) -> MssqlResult<DataRow> {
    let columns: Vec<String> = row
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let mut values = Vec::with_capacity(columns.len());
    for (index, column) in row.columns().iter().enumerate() {
        values.push(column_value(row, index, column.column_type())?);
    }
    Ok(DataRow::new(columns, values))
}

fn column_value(row: &Row, index: usize, ty: ColumnType) -> MssqlResult<DbValue> {
    let value = match ty {
        ColumnType::Bit | ColumnType::Bitn => {
            row.try_get::<bool, _>(index)?.map(DbValue::Bool)
        }
        ColumnType::Int1 => row
            .try_get::<u8, _>(index)?
            .map(|v| DbValue::I16(i16::from(v))),
        ColumnType::Int2 => row.try_get::<i16, _>(index)?.map(DbValue::I16),
        ColumnType::Int4 => row.try_get::<i32, _>(index)?.map(DbValue::I32),
        ColumnType::Int8 => row.try_get::<i64, _>(index)?.map(DbValue::I64),
        // Intn carries a variable width; try the common widths widest-last
        ColumnType::Intn => match row.try_get::<i32, _>(index) {
            Ok(v) => v.map(DbValue::I32),
            Err(_) => row.try_get::<i64, _>(index)?.map(DbValue::I64),
        },
        ColumnType::Float4 => row
            .try_get::<f32, _>(index)?
            .map(|v| DbValue::F64(f64::from(v))),
        ColumnType::Float8 | ColumnType::Floatn => {
            row.try_get::<f64, _>(index)?.map(DbValue::F64)
        }
        ColumnType::Money | ColumnType::Money4 => {
            row.try_get::<f64, _>(index)?.map(DbValue::F64)
        }
        ColumnType::Decimaln | ColumnType::Numericn => {
            row.try_get::<Decimal, _>(index)?.map(DbValue::Decimal)
        }
        ColumnType::Guid => row.try_get::<Uuid, _>(index)?.map(DbValue::Uuid),
        ColumnType::BigVarChar
        | ColumnType::BigChar
        | ColumnType::NVarchar
        | ColumnType::NChar
        | ColumnType::Text
        | ColumnType::NText
        | ColumnType::Xml => row
            .try_get::<&str, _>(index)?
            .map(|v| DbValue::String(v.to_string())),
        ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => row
            .try_get::<&[u8], _>(index)?
            .map(|v| DbValue::Bytes(v.to_vec())),
        ColumnType::Datetime
        | ColumnType::Datetime4
        | ColumnType::Datetimen
        | ColumnType::Datetime2 => row
            .try_get::<NaiveDateTime, _>(index)?
            .map(DbValue::DateTime),
        ColumnType::Daten => row
            .try_get::<NaiveDate, _>(index)?
            .map(|v| DbValue::DateTime(v.and_time(NaiveTime::MIN))),
        ColumnType::Timen => row
            .try_get::<NaiveTime, _>(index)?
            .map(|v| DbValue::String(v.to_string())),
        ColumnType::DatetimeOffsetn => row
            .try_get::<DateTime<Utc>, _>(index)?
            .map(|v| DbValue::DateTime(v.naive_utc())),
        ColumnType::Null => None,
        // variants and UDTs: fall back to text, and to null without one
        _ => row
            .try_get::<&str, _>(index)
            .ok()
            .flatten()
            .map(|v| DbValue::String(v.to_string())),
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
            let _ = bind_value(&value, DbType::NVarChar);
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
        params.push(Parameter::return_value("R", DbType::Int32));
        assert_eq!(bind_parameters(&params).len(), 1);
    }
}
