//! The PostgreSQL dialect: SQL fragments and type mapping.

use strata_core::{
    Backend, DateFormat, DatePart, DbType, Dialect, HostType, SqlFunction, split_qualified_name,
};

/// PostgreSQL SQL fragments and catalog queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDialect;

impl Dialect for PgDialect {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn default_schema(&self) -> &'static str {
        "public"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier)
    }

    fn qualify_table(&self, schema: Option<&str>, table: &str) -> String {
        let schema = match schema {
            Some(s) if !s.is_empty() => s,
            _ => self.default_schema(),
        };
        format!("{}.{}", schema, table)
    }

    fn identity_fetch_clause(&self, identity_column: &str) -> String {
        format!("RETURNING {}", identity_column)
    }

    fn convert_to_char(&self, column: &str) -> String {
        format!("CAST({} AS VARCHAR)", column)
    }

    fn date_to_string_for_column(&self, column: &str, format: DateFormat) -> String {
        match format {
            DateFormat::MmDdYyyy => format!(" TO_CHAR({}, 'MM/DD/YYYY')", column),
            DateFormat::MmDdYyyyHyphen => format!(" TO_CHAR({}, 'MM-DD-YYYY')", column),
            DateFormat::MonDdYyyy => format!(" TO_CHAR({}, 'Mon DD, YYYY')", column),
            DateFormat::Unformatted => column.to_string(),
        }
    }

    fn date_to_string_for_value(&self, value: &str, format: DateFormat) -> String {
        match format {
            DateFormat::MmDdYyyy => format!(" TO_CHAR('{}', 'MM/DD/YYYY')", value),
            DateFormat::MmDdYyyyHyphen => format!(" TO_CHAR('{}', 'MM-DD-YYYY')", value),
            DateFormat::MonDdYyyy => format!(" TO_CHAR('{}', 'Mon DD, YYYY')", value),
            DateFormat::Unformatted => format!("'{}'", value),
        }
    }

    fn date_only(&self, column: &str) -> String {
        format!("TO_CHAR({}, 'Mon DD, YYYY')", column)
    }

    fn if_null(&self, check: &str, fallback: &str) -> String {
        format!(" COALESCE({}, {}) ", check, fallback)
    }

    fn if_null_function(&self) -> &'static str {
        "COALESCE"
    }

    fn current_date_function(&self) -> &'static str {
        "CURRENT_DATE"
    }

    fn date_part(&self, date: &str, part: DatePart) -> String {
        let part = match part {
            DatePart::Day => "day",
            DatePart::Month => "month",
            DatePart::Year => "year",
        };
        format!("date_part('{}', '{}')", part, date)
    }

    fn year_of(&self, date: &str) -> String {
        format!("EXTRACT(YEAR FROM '{}'::timestamp)", date)
    }

    fn function_name(&self, function: SqlFunction) -> &'static str {
        match function {
            SqlFunction::Substring => "SUBSTRING",
            SqlFunction::IfNull => "COALESCE",
            SqlFunction::CurrentDate => "CURRENT_DATE",
            SqlFunction::Concat => "CONCAT",
        }
    }

    fn table_list_query(&self, schema: &str) -> String {
        format!(
            "SELECT table_name, table_schema FROM information_schema.tables \
             WHERE table_schema = '{}' AND table_type = 'BASE TABLE' ORDER BY table_name",
            schema
        )
    }

    fn view_list_query(&self, schema: &str) -> String {
        format!(
            "SELECT table_name, table_schema FROM information_schema.views \
             WHERE table_schema = '{}' ORDER BY table_name",
            schema
        )
    }

    fn table_definition_query(&self, table: &str, default_schema: &str) -> String {
        let (schema, table) = split_qualified_name(table, default_schema);
        format!(
            "SELECT C.COLUMN_NAME::varchar AS COLUMN_NAME, C.DATA_TYPE::varchar AS DATA_TYPE, \
             CASE WHEN C.IS_NULLABLE = 'NO' THEN 0 ELSE 1 END AS IS_NULLABLE, \
             CASE WHEN C.CHARACTER_MAXIMUM_LENGTH IS NULL THEN 0 ELSE C.CHARACTER_MAXIMUM_LENGTH END AS CHARACTER_MAXIMUM_LENGTH, \
             C.ORDINAL_POSITION - 1 AS ORDINAL_POSITION, \
             CASE WHEN C.IS_IDENTITY = 'NO' THEN 0 ELSE 1 END AS IS_IDENTITY \
             FROM INFORMATION_SCHEMA.COLUMNS C \
             WHERE C.TABLE_NAME = '{}' AND C.TABLE_SCHEMA = '{}' ORDER BY C.ORDINAL_POSITION",
            table, schema
        )
    }

    fn session_schema_query(&self) -> &'static str {
        "SELECT CURRENT_SCHEMA()"
    }

    fn logical_type(&self, catalog_name: &str) -> DbType {
        match catalog_name.to_lowercase().as_str() {
            "varbinary" | "binary" | "bytea" => DbType::VarBinary,
            "boolean" | "bool" => DbType::Bit,
            "character" | "char" | "bpchar" => DbType::Char,
            "character varying" | "varying" | "varchar" | "text" => DbType::VarChar,
            "date" | "timestamp" | "timestamptz" | "timestamp without time zone"
            | "timestamp with time zone" => DbType::DateTime,
            "time" | "time without time zone" => DbType::Time,
            "decimal" | "numeric" | "money" => DbType::Decimal,
            "float" | "double precision" | "real" | "float8" => DbType::Double,
            "bigint" | "int8" => DbType::Int64,
            "int" | "integer" | "int4" => DbType::Int32,
            "smallint" | "tinyint" | "int2" => DbType::Int16,
            "uuid" => DbType::Guid,
            "xml" => DbType::Xml,
            _ => DbType::VarChar,
        }
    }

    fn host_type(&self, catalog_name: &str) -> HostType {
        self.logical_type(catalog_name).host_type()
    }

    fn native_type_name(&self, db_type: DbType) -> &'static str {
        match db_type {
            DbType::VarChar | DbType::NVarChar => "VARCHAR",
            DbType::Char => "CHAR",
            DbType::Int16 | DbType::TinyInt => "SMALLINT",
            DbType::Int32 => "INTEGER",
            DbType::Int64 => "BIGINT",
            DbType::Double => "DOUBLE PRECISION",
            DbType::Decimal => "NUMERIC",
            DbType::DateTime | DbType::DateTime2 => "TIMESTAMP",
            DbType::Time => "TIME",
            DbType::Bit => "BOOLEAN",
            DbType::Guid => "UUID",
            DbType::Blob | DbType::Image | DbType::VarBinary => "BYTEA",
            DbType::Xml => "XML",
            DbType::SqlVariant => "TEXT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_qualification_defaults_to_public() {
        let dialect = PgDialect;
        assert_eq!(dialect.qualify_table(None, "Users"), "public.Users");
        assert_eq!(dialect.qualify_table(Some("sales"), "Users"), "sales.Users");
        assert_eq!(dialect.quote_identifier("Users"), "\"Users\"");
    }

    #[test]
    fn test_identity_retrieval_uses_returning() {
        let dialect = PgDialect;
        assert_eq!(dialect.identity_fetch_clause("Id"), "RETURNING Id");
    }

    #[test]
    fn test_date_fragments() {
        let dialect = PgDialect;
        assert_eq!(
            dialect.date_to_string_for_column("Created", DateFormat::MmDdYyyy),
            " TO_CHAR(Created, 'MM/DD/YYYY')"
        );
        assert_eq!(
            dialect.date_part("2024-05-01", DatePart::Month),
            "date_part('month', '2024-05-01')"
        );
        assert_eq!(dialect.current_date_function(), "CURRENT_DATE");
        assert_eq!(
            dialect.year_of("2024-05-01"),
            "EXTRACT(YEAR FROM '2024-05-01'::timestamp)"
        );
    }

    #[test]
    fn test_null_coalescing() {
        let dialect = PgDialect;
        assert_eq!(dialect.if_null("a", "b"), " COALESCE(a, b) ");
        assert_eq!(dialect.function_name(SqlFunction::IfNull), "COALESCE");
        assert_eq!(dialect.function_name(SqlFunction::Concat), "CONCAT");
    }

    #[test]
    fn test_catalog_queries() {
        let dialect = PgDialect;
        let sql = dialect.table_list_query("public");
        assert!(sql.contains("information_schema.tables"));
        assert!(sql.contains("table_schema = 'public'"));
        assert!(sql.ends_with("ORDER BY table_name"));

        let sql = dialect.table_definition_query("Users", "public");
        assert!(sql.contains("TABLE_NAME = 'Users'"));
        assert!(sql.contains("TABLE_SCHEMA = 'public'"));

        // a qualified name overrides the default schema
        let sql = dialect.table_definition_query("sales.Orders", "public");
        assert!(sql.contains("TABLE_NAME = 'Orders'"));
        assert!(sql.contains("TABLE_SCHEMA = 'sales'"));
    }

    #[test]
    fn test_qualified_and_bare_names_agree_on_default_schema() {
        let dialect = PgDialect;
        assert_eq!(
            dialect.table_definition_query("public.Users", "public"),
            dialect.table_definition_query("Users", "public")
        );
    }

    #[test]
    fn test_type_mapping_round_trip() {
        let dialect = PgDialect;
        assert_eq!(dialect.logical_type("integer"), DbType::Int32);
        assert_eq!(dialect.logical_type("VARCHAR"), DbType::VarChar);
        assert_eq!(dialect.logical_type("timestamptz"), DbType::DateTime);
        assert_eq!(dialect.logical_type("uuid"), DbType::Guid);
        // unknown catalog names fall back to variable character
        assert_eq!(dialect.logical_type("tsvector"), DbType::VarChar);

        assert_eq!(dialect.host_type("bigint"), HostType::I64);
        assert_eq!(dialect.host_type("bytea"), HostType::Bytes);

        // every logical type has a native name, and representative catalog
        // names round-trip through the logical type
        for db_type in DbType::ALL {
            assert!(!dialect.native_type_name(db_type).is_empty());
        }
        for (name, db_type) in [
            ("integer", DbType::Int32),
            ("bigint", DbType::Int64),
            ("numeric", DbType::Decimal),
            ("uuid", DbType::Guid),
            ("boolean", DbType::Bit),
        ] {
            assert_eq!(dialect.logical_type(name), db_type);
            assert_eq!(
                dialect.logical_type(&dialect.native_type_name(db_type).to_lowercase()),
                db_type
            );
        }
    }
}
