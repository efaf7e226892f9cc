//! Query Builder SQL generation (Postgres dialect)

use serde_json::{Map, Value};

use super::builder::QueryBuilder;
use super::types::*;

/// SQL text with `$n` placeholders and the values to bind, in order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Quote a possibly qualified identifier: `t.c` -> `"t"."c"`, `t.*` -> `"t".*`
pub fn quote_identifier(identifier: &str) -> String {
    identifier
        .split('.')
        .map(|part| {
            if part == "*" {
                part.to_string()
            } else {
                format!("\"{}\"", part.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

impl QueryBuilder {
    /// Render a SELECT statement
    pub fn to_select_sql(&self) -> SqlStatement {
        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        if self.select_fields.is_empty() {
            sql.push('*');
        } else {
            let fields: Vec<String> = self.select_fields.iter().map(|f| quote_identifier(f)).collect();
            sql.push_str(&fields.join(", "));
        }

        if let Some(table) = &self.from_table {
            sql.push_str(" FROM ");
            sql.push_str(&quote_identifier(table));
        }

        for join in &self.joins {
            sql.push_str(&format!(" {} {} ON ", join.join_type, quote_identifier(&join.table)));
            let conditions: Vec<String> = join
                .on_conditions
                .iter()
                .map(|(left, right)| format!("{} = {}", quote_identifier(left), quote_identifier(right)))
                .collect();
            sql.push_str(&conditions.join(" AND "));
        }

        self.build_where_clause(&mut sql, &mut params);
        self.build_order_limit_clause(&mut sql);

        SqlStatement { sql, params }
    }

    /// Render an UPDATE of the selected rows
    pub fn to_update_sql(&self, values: &Map<String, Value>) -> SqlStatement {
        let mut sql = format!("UPDATE {} SET ", quote_identifier(self.from_table.as_deref().unwrap_or_default()));
        let mut params = Vec::new();

        let assignments: Vec<String> = values
            .iter()
            .map(|(column, value)| format!("{} = {}", quote_identifier(column), placeholder(value, &mut params)))
            .collect();
        sql.push_str(&assignments.join(", "));

        self.build_where_clause(&mut sql, &mut params);
        SqlStatement { sql, params }
    }

    /// Render a DELETE of the selected rows
    pub fn to_delete_sql(&self) -> SqlStatement {
        let mut sql = format!("DELETE FROM {}", quote_identifier(self.from_table.as_deref().unwrap_or_default()));
        let mut params = Vec::new();
        self.build_where_clause(&mut sql, &mut params);
        SqlStatement { sql, params }
    }

    /// Helper method to build WHERE clauses
    fn build_where_clause(&self, sql: &mut String, params: &mut Vec<Value>) {
        if self.where_conditions.is_empty() {
            return;
        }

        sql.push_str(" WHERE ");
        for (i, condition) in self.where_conditions.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            let column = quote_identifier(&condition.column);

            match condition.operator {
                QueryOperator::In | QueryOperator::NotIn => {
                    if condition.values.is_empty() {
                        // IN () is not valid SQL
                        let constant = if condition.operator == QueryOperator::In { "FALSE" } else { "TRUE" };
                        sql.push_str(constant);
                        continue;
                    }
                    let placeholders: Vec<String> = condition
                        .values
                        .iter()
                        .map(|value| {
                            params.push(value.clone());
                            format!("${}", params.len())
                        })
                        .collect();
                    sql.push_str(&format!("{} {} ({})", column, condition.operator, placeholders.join(", ")));
                }
                QueryOperator::IsNull | QueryOperator::IsNotNull => {
                    sql.push_str(&format!("{} {}", column, condition.operator));
                }
                _ => match &condition.value {
                    Some(Value::Null) if condition.operator == QueryOperator::Equal => {
                        sql.push_str(&format!("{} IS NULL", column));
                    }
                    Some(Value::Null) if condition.operator == QueryOperator::NotEqual => {
                        sql.push_str(&format!("{} IS NOT NULL", column));
                    }
                    Some(value) => {
                        params.push(value.clone());
                        sql.push_str(&format!("{} {} ${}", column, condition.operator, params.len()));
                    }
                    None => sql.push_str(&format!("{} IS NULL", column)),
                },
            }
        }
    }

    /// Helper method to build ORDER BY and LIMIT clauses
    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            let clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", quote_identifier(column), direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&clauses.join(", "));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }
}

/// Render an INSERT returning the generated key
pub fn insert_sql(table: &str, values: &Map<String, Value>, id_column: &str) -> SqlStatement {
    let table = quote_identifier(table);
    let returning = quote_identifier(id_column);

    if values.is_empty() {
        return SqlStatement {
            sql: format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning),
            params: Vec::new(),
        };
    }

    let mut params = Vec::new();
    let columns: Vec<String> = values.keys().map(|c| quote_identifier(c)).collect();
    let placeholders: Vec<String> = values.values().map(|value| placeholder(value, &mut params)).collect();

    SqlStatement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            columns.join(", "),
            placeholders.join(", "),
            returning
        ),
        params,
    }
}

/// `NULL` inline, otherwise the next `$n` with the value queued for binding
fn placeholder(value: &Value, params: &mut Vec<Value>) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    params.push(value.clone());
    format!("${}", params.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Parents"), "\"Parents\"");
        assert_eq!(quote_identifier("Patients.*"), "\"Patients\".*");
        assert_eq!(quote_identifier("DoctorPatients.doctorId"), "\"DoctorPatients\".\"doctorId\"");
        assert_eq!(quote_identifier("*"), "*");
    }

    #[test]
    fn test_select_with_join_and_in() {
        let statement = QueryBuilder::table("Patients")
            .select("Patients.*, DoctorPatients.doctorId")
            .join("DoctorPatients", "Patients.id", "DoctorPatients.patientId")
            .where_in("DoctorPatients.doctorId", vec![1, 2])
            .to_select_sql();

        assert_eq!(
            statement.sql,
            "SELECT \"Patients\".*, \"DoctorPatients\".\"doctorId\" FROM \"Patients\" \
             INNER JOIN \"DoctorPatients\" ON \"Patients\".\"id\" = \"DoctorPatients\".\"patientId\" \
             WHERE \"DoctorPatients\".\"doctorId\" IN ($1, $2)"
        );
        assert_eq!(statement.params, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_select_with_order_limit_offset() {
        let statement = QueryBuilder::table("Children")
            .where_eq("parentId", 3)
            .where_null("deletedAt")
            .order_by_desc("name")
            .limit(10)
            .offset(20)
            .to_select_sql();
        assert_eq!(
            statement.sql,
            "SELECT * FROM \"Children\" WHERE \"parentId\" = $1 AND \"deletedAt\" IS NULL \
             ORDER BY \"name\" DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_null_comparisons_render_is_null() {
        let statement = QueryBuilder::table("Children")
            .where_eq("parentId", Value::Null)
            .where_ne("deletedAt", Value::Null)
            .to_select_sql();
        assert_eq!(
            statement.sql,
            "SELECT * FROM \"Children\" WHERE \"parentId\" IS NULL AND \"deletedAt\" IS NOT NULL"
        );
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let statement = QueryBuilder::table("Children").where_in::<i64>("id", vec![]).to_select_sql();
        assert_eq!(statement.sql, "SELECT * FROM \"Children\" WHERE FALSE");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_update_numbers_params_before_where() {
        let values = json!({ "name": "New", "updatedAt": "2024-01-01T00:00:00Z" });
        let statement = QueryBuilder::table("Parents")
            .where_eq("id", 7)
            .to_update_sql(values.as_object().unwrap());
        assert_eq!(
            statement.sql,
            "UPDATE \"Parents\" SET \"name\" = $1, \"updatedAt\" = $2 WHERE \"id\" = $3"
        );
        assert_eq!(statement.params.len(), 3);
    }

    #[test]
    fn test_insert_and_delete() {
        let values = json!({ "name": "Ann" });
        let insert = insert_sql("Parents", values.as_object().unwrap(), "id");
        assert_eq!(
            insert.sql,
            "INSERT INTO \"Parents\" (\"name\") VALUES ($1) RETURNING \"id\""
        );
        assert_eq!(
            insert_sql("Parents", &Map::new(), "id").sql,
            "INSERT INTO \"Parents\" DEFAULT VALUES RETURNING \"id\""
        );

        let with_null = insert_sql("Parents", json!({ "name": "Ann", "deletedAt": null, "age": 3 }).as_object().unwrap(), "id");
        assert_eq!(
            with_null.sql,
            "INSERT INTO \"Parents\" (\"name\", \"deletedAt\", \"age\") VALUES ($1, NULL, $2) RETURNING \"id\""
        );
        assert_eq!(with_null.params, vec![json!("Ann"), json!(3)]);

        let delete = QueryBuilder::table("Parents").where_eq("id", 1).to_delete_sql();
        assert_eq!(delete.sql, "DELETE FROM \"Parents\" WHERE \"id\" = $1");
    }
}
