//! Schema Builder - DSL for the catalog tables
//!
//! Produces the DDL for `module_templates` and `module_parameters`. Every
//! statement is re-runnable (`IF NOT EXISTS` / `IF EXISTS`) so `migrate` can
//! be applied to a database that already has the catalog.

use crate::models::{Model, ModuleParameter, ModuleTemplate};

/// Ordered list of schema statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    statements: Vec<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table unless it already exists
    pub fn create_table<F>(&mut self, table_name: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut TableBuilder),
    {
        let mut table_builder = TableBuilder::new(table_name);
        callback(&mut table_builder);
        self.statements.push(table_builder.to_sql());
        self
    }

    pub fn drop_table(&mut self, table_name: &str) -> &mut Self {
        self.statements
            .push(format!("DROP TABLE IF EXISTS {};", table_name));
        self
    }

    /// Create an index, named `idx_<table>_<columns>` unless a name is given
    pub fn create_index(
        &mut self,
        table_name: &str,
        column_names: &[&str],
        index_name: Option<&str>,
    ) -> &mut Self {
        let default_name = format!("idx_{}_{}", table_name, column_names.join("_"));
        let index_name = index_name.unwrap_or(&default_name);
        self.statements.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
            index_name,
            table_name,
            column_names.join(", ")
        ));
        self
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// All statements as a single SQL string
    pub fn build(&self) -> String {
        self.statements.join("\n")
    }
}

/// Builder for one CREATE TABLE statement
#[derive(Debug)]
pub struct TableBuilder {
    table_name: String,
    columns: Vec<String>,
    constraints: Vec<String>,
}

impl TableBuilder {
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a raw column definition
    pub fn column(&mut self, name: &str, column_type: &str) -> &mut Self {
        self.columns.push(format!("{} {}", name, column_type));
        self
    }

    /// 64-bit auto-increment primary key
    pub fn big_id(&mut self, name: &str) -> &mut Self {
        self.columns.push(format!("{} BIGSERIAL PRIMARY KEY", name));
        self
    }

    /// `TEXT NOT NULL` column that must not be blank
    pub fn required_text(&mut self, name: &str) -> &mut Self {
        self.columns.push(format!("{} TEXT NOT NULL", name));
        self.check(&format!("{}_not_blank", name), &format!("btrim({}) <> ''", name))
    }

    pub fn big_integer(&mut self, name: &str) -> &mut Self {
        self.columns.push(format!("{} BIGINT NOT NULL", name));
        self
    }

    /// `created_at` / `updated_at` assigned by the database
    pub fn timestamps(&mut self) -> &mut Self {
        self.columns
            .push("created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()".to_string());
        self.columns
            .push("updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()".to_string());
        self
    }

    /// Foreign key that deletes children with their parent
    pub fn foreign_key(
        &mut self,
        column: &str,
        references_table: &str,
        references_column: &str,
    ) -> &mut Self {
        self.constraints.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
            column, references_table, references_column
        ));
        self
    }

    pub fn check(&mut self, name: &str, expression: &str) -> &mut Self {
        self.constraints.push(format!(
            "CONSTRAINT {}_{} CHECK ({})",
            self.table_name, name, expression
        ));
        self
    }

    pub fn to_sql(&self) -> String {
        let mut parts = self.columns.clone();
        parts.extend(self.constraints.iter().cloned());

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.table_name,
            parts.join(",\n    ")
        )
    }
}

/// Statements creating both catalog tables and their lookup indexes
pub fn catalog_schema() -> SchemaBuilder {
    let templates = ModuleTemplate::table_name();
    let parameters = ModuleParameter::table_name();

    let mut builder = SchemaBuilder::new();
    builder
        .create_table(templates, |table| {
            table.big_id("id");
            table.required_text("name");
            table.required_text("file");
            table.required_text("javascript_model");
            table.timestamps();
        })
        .create_index(templates, &["file"], None)
        .create_index(templates, &["javascript_model"], None)
        .create_table(parameters, |table| {
            table.big_id("id");
            table.required_text("key");
            table.big_integer("module_template_id");
            table.timestamps();
            table.foreign_key("module_template_id", templates, "id");
        })
        .create_index(parameters, &["module_template_id"], None);
    builder
}

/// Statements dropping both catalog tables, children first
pub fn drop_catalog_schema() -> SchemaBuilder {
    let mut builder = SchemaBuilder::new();
    builder
        .drop_table(ModuleParameter::table_name())
        .drop_table(ModuleTemplate::table_name());
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_builder() {
        let mut table = TableBuilder::new("module_parameters");
        table.big_id("id");
        table.required_text("key");
        table.big_integer("module_template_id");
        table.foreign_key("module_template_id", "module_templates", "id");

        let sql = table.to_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS module_parameters"));
        assert!(sql.contains("id BIGSERIAL PRIMARY KEY"));
        assert!(sql.contains("key TEXT NOT NULL"));
        assert!(sql.contains("CONSTRAINT module_parameters_key_not_blank CHECK (btrim(key) <> '')"));
        assert!(sql.contains("module_template_id BIGINT NOT NULL"));
        assert!(sql.contains(
            "FOREIGN KEY (module_template_id) REFERENCES module_templates (id) ON DELETE CASCADE"
        ));
    }

    #[test]
    fn test_catalog_schema_order() {
        let builder = catalog_schema();
        let statements = builder.statements();
        assert_eq!(statements.len(), 5);
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS module_templates"));
        assert!(statements[0].contains("javascript_model TEXT NOT NULL"));
        assert!(statements[0].contains("created_at TIMESTAMPTZ"));
        assert_eq!(
            statements[1],
            "CREATE INDEX IF NOT EXISTS idx_module_templates_file ON module_templates (file);"
        );
        assert!(statements[3].contains("CREATE TABLE IF NOT EXISTS module_parameters"));
        assert_eq!(
            statements[4],
            "CREATE INDEX IF NOT EXISTS idx_module_parameters_module_template_id ON module_parameters (module_template_id);"
        );
    }

    #[test]
    fn test_drop_children_first() {
        let sql = drop_catalog_schema().build();
        assert_eq!(
            sql,
            "DROP TABLE IF EXISTS module_parameters;\nDROP TABLE IF EXISTS module_templates;"
        );
    }
}
