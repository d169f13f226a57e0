//! The SQL Server dialect: SQL fragments and type mapping.

use strata_core::{
    Backend, DateFormat, DatePart, DbType, Dialect, HostType, SqlFunction, split_qualified_name,
};

/// SQL Server SQL fragments and catalog queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl Dialect for MssqlDialect {
    fn backend(&self) -> Backend {
        Backend::SqlServer
    }

    fn default_schema(&self) -> &'static str {
        "dbo"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("[{}]", identifier)
    }

    fn qualify_table(&self, schema: Option<&str>, table: &str) -> String {
        let schema = match schema {
            Some(s) if !s.is_empty() => s,
            _ => self.default_schema(),
        };
        format!("[{}].[{}]", schema, table)
    }

    fn select_lock_hint(&self) -> &'static str {
        "WITH (NOLOCK)"
    }

    fn identity_fetch_clause(&self, _identity_column: &str) -> String {
        // Runs in the same batch as the INSERT, so the scalar read is atomic
        // with it.
        "SELECT SCOPE_IDENTITY()".to_string()
    }

    fn string_parameter_type(&self) -> DbType {
        DbType::NVarChar
    }

    fn convert_to_char(&self, column: &str) -> String {
        format!("CONVERT(varchar, {})", column)
    }

    fn date_to_string_for_column(&self, column: &str, format: DateFormat) -> String {
        match format {
            DateFormat::MmDdYyyy => format!(" CONVERT(VARCHAR, {}, 101) ", column),
            DateFormat::MmDdYyyyHyphen => format!(" CONVERT(VARCHAR, {}, 110) ", column),
            DateFormat::MonDdYyyy => format!(" CONVERT(VARCHAR, {}, 107) ", column),
            DateFormat::Unformatted => column.to_string(),
        }
    }

    fn date_to_string_for_value(&self, value: &str, format: DateFormat) -> String {
        match format {
            DateFormat::MmDdYyyy => format!(" CONVERT(VARCHAR, '{}', 101) ", value),
            DateFormat::MmDdYyyyHyphen => format!(" CONVERT(VARCHAR, '{}', 110) ", value),
            DateFormat::MonDdYyyy => format!(" CONVERT(VARCHAR, '{}', 107) ", value),
            DateFormat::Unformatted => format!("'{}'", value),
        }
    }

    fn date_only(&self, column: &str) -> String {
        format!("CONVERT(VARCHAR, {}, 107)", column)
    }

    fn if_null(&self, check: &str, fallback: &str) -> String {
        format!(" ISNULL({}, {}) ", check, fallback)
    }

    fn if_null_function(&self) -> &'static str {
        "ISNULL"
    }

    fn current_date_function(&self) -> &'static str {
        "GETDATE()"
    }

    fn date_part(&self, date: &str, part: DatePart) -> String {
        let part = match part {
            DatePart::Day => "day",
            DatePart::Month => "month",
            DatePart::Year => "year",
        };
        format!("DATEPART({}, '{}')", part, date)
    }

    fn year_of(&self, date: &str) -> String {
        format!("YEAR({})", date)
    }

    fn function_name(&self, function: SqlFunction) -> &'static str {
        match function {
            SqlFunction::Substring => "SUBSTRING",
            SqlFunction::IfNull => "ISNULL",
            SqlFunction::CurrentDate => "GETDATE()",
            SqlFunction::Concat => "+",
        }
    }

    fn table_list_query(&self, _schema: &str) -> String {
        "SELECT TABLE_NAME, TABLE_SCHEMA FROM INFORMATION_SCHEMA.TABLES ORDER BY TABLE_NAME"
            .to_string()
    }

    fn view_list_query(&self, _schema: &str) -> String {
        "SELECT TABLE_NAME, TABLE_SCHEMA FROM INFORMATION_SCHEMA.VIEWS ORDER BY TABLE_NAME"
            .to_string()
    }

    fn table_definition_query(&self, table: &str, default_schema: &str) -> String {
        let (schema, table) = split_qualified_name(table, default_schema);
        format!(
            "SELECT C.COLUMN_NAME, C.DATA_TYPE, \
             CASE WHEN C.IS_NULLABLE = 'NO' THEN 0 ELSE 1 END AS IS_NULLABLE, \
             CASE WHEN C.CHARACTER_MAXIMUM_LENGTH IS NULL THEN 0 ELSE C.CHARACTER_MAXIMUM_LENGTH END AS CHARACTER_MAXIMUM_LENGTH, \
             C.ORDINAL_POSITION - 1 AS ORDINAL_POSITION, \
             COLUMNPROPERTY(OBJECT_ID(C.TABLE_SCHEMA + '.' + C.TABLE_NAME), C.COLUMN_NAME, 'IsIdentity') AS IS_IDENTITY, \
             CASE WHEN K.COLUMN_NAME IS NULL THEN 0 ELSE 1 END AS IS_PRIMARY_KEY \
             FROM INFORMATION_SCHEMA.COLUMNS C \
             LEFT OUTER JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE K \
             ON C.COLUMN_NAME = K.COLUMN_NAME AND C.TABLE_NAME = K.TABLE_NAME \
             AND OBJECTPROPERTY(OBJECT_ID(K.CONSTRAINT_SCHEMA + '.' + K.CONSTRAINT_NAME), 'IsPrimaryKey') = 1 \
             WHERE C.TABLE_NAME = '{}' AND C.TABLE_SCHEMA = '{}' ORDER BY C.ORDINAL_POSITION",
            table, schema
        )
    }

    fn session_schema_query(&self) -> &'static str {
        "SELECT SCHEMA_NAME()"
    }

    fn logical_type(&self, catalog_name: &str) -> DbType {
        match catalog_name.to_lowercase().as_str() {
            "bigint" => DbType::Int64,
            "varbinary" | "binary" => DbType::VarBinary,
            "bit" => DbType::Bit,
            "char" | "nchar" => DbType::Char,
            "ntext" | "nvarchar" => DbType::NVarChar,
            "text" | "varchar" => DbType::VarChar,
            "date" | "datetime" | "smalldatetime" => DbType::DateTime,
            "datetime2" | "datetimeoffset" => DbType::DateTime2,
            "decimal" | "numeric" | "smallmoney" | "money" => DbType::Decimal,
            "float" | "real" => DbType::Double,
            "int" => DbType::Int32,
            "smallint" => DbType::Int16,
            "variant" | "sql_variant" => DbType::SqlVariant,
            "time" | "timestamp" => DbType::Time,
            "tinyint" => DbType::TinyInt,
            "uniqueidentifier" => DbType::Guid,
            "image" => DbType::Image,
            "xml" => DbType::Xml,
            _ => DbType::VarChar,
        }
    }

    fn host_type(&self, catalog_name: &str) -> HostType {
        match catalog_name.to_lowercase().as_str() {
            // timestamp is the legacy rowversion type, surfaced as bytes
            "timestamp" => HostType::Bytes,
            other => self.logical_type(other).host_type(),
        }
    }

    fn native_type_name(&self, db_type: DbType) -> &'static str {
        match db_type {
            DbType::VarChar => "VARCHAR",
            DbType::NVarChar => "NVARCHAR",
            DbType::Char => "CHAR",
            DbType::Int16 => "SMALLINT",
            DbType::Int32 => "INT",
            DbType::Int64 => "BIGINT",
            DbType::TinyInt => "TINYINT",
            DbType::Double => "FLOAT",
            DbType::Decimal => "DECIMAL",
            DbType::DateTime => "DATETIME",
            DbType::DateTime2 => "DATETIME2",
            DbType::Time => "TIME",
            DbType::Bit => "BIT",
            DbType::Guid => "UNIQUEIDENTIFIER",
            DbType::Blob => "VARBINARY(MAX)",
            DbType::Image => "IMAGE",
            DbType::VarBinary => "VARBINARY",
            DbType::Xml => "XML",
            DbType::SqlVariant => "SQL_VARIANT",
        }
    }
}
