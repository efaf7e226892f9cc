//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use serde_json::{Map, Value};

impl QueryBuilder {
    fn push_condition(mut self, column: &str, operator: QueryOperator, value: Option<Value>, values: Vec<Value>) -> Self {
        self.where_conditions.push(WhereCondition {
            column: column.to_string(),
            operator,
            value,
            values,
        });
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::Equal, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::NotEqual, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::GreaterThan, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with greater than or equal
    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::GreaterThanOrEqual, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::LessThan, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with less than or equal
    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::LessThanOrEqual, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with LIKE (`%` and `_` wildcards)
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(column, QueryOperator::Like, Some(Value::String(pattern.to_string())), Vec::new())
    }

    /// Add WHERE condition with NOT LIKE
    pub fn where_not_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(column, QueryOperator::NotLike, Some(Value::String(pattern.to_string())), Vec::new())
    }

    /// Add WHERE condition with IN
    pub fn where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_condition(column, QueryOperator::In, None, values)
    }

    /// Add WHERE condition with NOT IN
    pub fn where_not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_condition(column, QueryOperator::NotIn, None, values)
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNull, None, Vec::new())
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNotNull, None, Vec::new())
    }

    /// Equality on every entry of `filter`; `null` entries match NULL columns
    pub fn where_map(self, filter: &Map<String, Value>) -> Self {
        filter.iter().fold(self, |query, (column, value)| match value {
            Value::Null => query.where_null(column),
            value => query.where_eq(column, value.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conditions_accumulate_in_order() {
        let query = QueryBuilder::table("Children")
            .where_eq("parentId", 1)
            .where_in("id", vec![1, 2, 3])
            .where_null("deletedAt");

        let operators: Vec<_> = query.conditions().iter().map(|c| c.operator.clone()).collect();
        assert_eq!(
            operators,
            vec![QueryOperator::Equal, QueryOperator::In, QueryOperator::IsNull]
        );
        assert_eq!(query.conditions()[1].values, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_where_map_handles_null() {
        let filter = json!({ "name": "Ann", "deletedAt": null });
        let query = QueryBuilder::table("People").where_map(filter.as_object().unwrap());
        assert_eq!(query.conditions()[0].operator, QueryOperator::Equal);
        assert_eq!(query.conditions()[1].operator, QueryOperator::IsNull);
    }
}
