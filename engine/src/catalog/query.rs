//! Catalog query language
//!
//! Filter expressions come from the classification model, so nothing here
//! executes code. The text is parsed with the pest grammar in `query.pest`,
//! built into a [`Query`], type-checked against the column types and
//! evaluated by [`Query::apply`].
//!
//! ```text
//! query      := selection? order? limit?
//! selection  := "ALL" | or_expr
//! or_expr    := and_expr (("OR" | "||") and_expr)*
//! and_expr   := unary (("AND" | "&&") unary)*
//! unary      := ("NOT" | "!")* ("(" or_expr ")" | comparison)
//! comparison := field "NOT"? ("IN" list | "CONTAINS" literal) | field op literal
//! order      := "ORDER" "BY" field ("ASC" | "DESC")?
//! limit      := "LIMIT" integer
//! ```
//!
//! Brackets and negations may nest at most [`MAX_NESTING`] levels deep.
//! Keywords and text comparisons are case-insensitive. Lines starting with
//! `#` and markdown code fences are ignored.
//!
//! # Examples
//!
//! ```
//! use forkcast_engine::catalog::query::Query;
//!
//! let query = Query::parse(r#"dietary == "Vegetarian" AND price < 200 ORDER BY rating DESC LIMIT 3"#)
//!     .unwrap();
//! assert_eq!(query.limit, Some(3));
//! ```

use forkcast_sdk::types::{Dietary, Dish, SpiceLevel};
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use std::cmp::Ordering;
use std::fmt;

/// Errors raised while parsing or type-checking a query
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("empty query")]
    Empty,

    #[error("syntax error at column {column}: {message}")]
    Syntax { column: usize, message: String },

    #[error("query nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("LIMIT expects a whole number, got '{0}'")]
    InvalidLimit(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("operator {op} cannot be applied to field '{field}'")]
    UnsupportedOperator { field: Field, op: Operator },

    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: Field,
        expected: &'static str,
        found: String,
    },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: Field, reason: String },
}

type Result<T> = std::result::Result<T, FilterError>;

/// A catalog column that can be filtered or sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Name,
    Restaurant,
    Cuisine,
    Category,
    Price,
    Rating,
    Dietary,
    SpiceLevel,
    PrepTime,
    Tags,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
    Dietary,
    Spice,
    Tags,
}

impl Field {
    /// Resolve a column name, accepting the catalog file's column names and
    /// their short forms
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name.to_ascii_lowercase().as_str() {
            "dish_id" | "id" => Field::Id,
            "dish_name" | "name" | "dish" => Field::Name,
            "restaurant" => Field::Restaurant,
            "cuisine" => Field::Cuisine,
            "category" => Field::Category,
            "price" => Field::Price,
            "rating" => Field::Rating,
            "dietary" | "diet" => Field::Dietary,
            "spice_level" | "spice" => Field::SpiceLevel,
            "prep_time_mins" | "prep_time" => Field::PrepTime,
            "tags" | "tag" => Field::Tags,
            "description" => Field::Description,
            _ => return None,
        };
        Some(field)
    }

    /// Canonical column name
    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "dish_id",
            Field::Name => "dish_name",
            Field::Restaurant => "restaurant",
            Field::Cuisine => "cuisine",
            Field::Category => "category",
            Field::Price => "price",
            Field::Rating => "rating",
            Field::Dietary => "dietary",
            Field::SpiceLevel => "spice_level",
            Field::PrepTime => "prep_time_mins",
            Field::Tags => "tags",
            Field::Description => "description",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            Field::Id
            | Field::Name
            | Field::Restaurant
            | Field::Cuisine
            | Field::Category
            | Field::Description => FieldKind::Text,
            Field::Price | Field::Rating | Field::PrepTime => FieldKind::Number,
            Field::Dietary => FieldKind::Dietary,
            Field::SpiceLevel => FieldKind::Spice,
            Field::Tags => FieldKind::Tags,
        }
    }

    fn value_of<'a>(&self, dish: &'a Dish) -> FieldValue<'a> {
        match self {
            Field::Id => FieldValue::Text(&dish.id),
            Field::Name => FieldValue::Text(&dish.name),
            Field::Restaurant => FieldValue::Text(&dish.restaurant),
            Field::Cuisine => FieldValue::Text(&dish.cuisine),
            Field::Category => FieldValue::Text(&dish.category),
            Field::Description => FieldValue::Text(&dish.description),
            Field::Price => FieldValue::Number(f64::from(dish.price)),
            Field::Rating => FieldValue::Number(dish.rating),
            Field::PrepTime => FieldValue::Number(f64::from(dish.prep_time_mins)),
            Field::Dietary => FieldValue::Dietary(dish.dietary),
            Field::SpiceLevel => FieldValue::Spice(dish.spice_level),
            Field::Tags => FieldValue::Tags(&dish.tags),
        }
    }

    fn supports(&self, op: Operator) -> bool {
        use Operator::*;
        match self.kind() {
            FieldKind::Text | FieldKind::Tags => matches!(op, Eq | Ne | Contains | In),
            FieldKind::Number | FieldKind::Spice => {
                matches!(op, Eq | Ne | Lt | Le | Gt | Ge | In)
            }
            FieldKind::Dietary => matches!(op, Eq | Ne | In),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Dietary(Dietary),
    Spice(SpiceLevel),
    Tags(&'a [String]),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    In,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Contains => "CONTAINS",
            Operator::In => "IN",
        };
        f.write_str(s)
    }
}

/// A type-checked literal
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Dietary(Dietary),
    Spice(SpiceLevel),
    List(Vec<Value>),
}

/// A single `field op value` test
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: Field,
    pub op: Operator,
    pub value: Value,
}

impl Comparison {
    fn matches(&self, dish: &Dish) -> bool {
        match (&self.op, &self.value) {
            (Operator::In, Value::List(items)) => {
                items.iter().any(|item| self.test(dish, Operator::Eq, item))
            }
            (op, value) => self.test(dish, *op, value),
        }
    }

    fn test(&self, dish: &Dish, op: Operator, value: &Value) -> bool {
        match (self.field.value_of(dish), value) {
            (FieldValue::Text(text), Value::Text(lit)) => match op {
                Operator::Eq => text.eq_ignore_ascii_case(lit),
                Operator::Ne => !text.eq_ignore_ascii_case(lit),
                Operator::Contains => text.to_lowercase().contains(&lit.to_lowercase()),
                _ => false,
            },
            (FieldValue::Number(n), Value::Number(lit)) => compare(op, n.partial_cmp(lit)),
            (FieldValue::Dietary(d), Value::Dietary(lit)) => match op {
                Operator::Eq => d == *lit,
                Operator::Ne => d != *lit,
                _ => false,
            },
            (FieldValue::Spice(s), Value::Spice(lit)) => compare(op, Some(s.cmp(lit))),
            (FieldValue::Tags(tags), Value::Text(lit)) => match op {
                Operator::Eq => dish.has_tag(lit),
                Operator::Ne => !dish.has_tag(lit),
                Operator::Contains => {
                    let needle = lit.to_lowercase();
                    tags.iter().any(|t| t.to_lowercase().contains(&needle))
                }
                _ => false,
            },
            _ => false,
        }
    }
}

fn compare(op: Operator, ordering: Option<Ordering>) -> bool {
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        Operator::Eq => ordering == Ordering::Equal,
        Operator::Ne => ordering != Ordering::Equal,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Le => ordering != Ordering::Greater,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Ge => ordering != Ordering::Less,
        Operator::Contains | Operator::In => false,
    }
}

/// Boolean combination of comparisons
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare(Comparison),
}

impl Predicate {
    pub fn matches(&self, dish: &Dish) -> bool {
        match self {
            Predicate::All(parts) => parts.iter().all(|p| p.matches(dish)),
            Predicate::Any(parts) => parts.iter().any(|p| p.matches(dish)),
            Predicate::Not(inner) => !inner.matches(dish),
            Predicate::Compare(cmp) => cmp.matches(dish),
        }
    }
}

/// Sort key from an `ORDER BY` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub descending: bool,
}

/// A parsed catalog query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// `None` selects every dish
    pub selection: Option<Predicate>,
    pub order: Option<SortKey>,
    pub limit: Option<usize>,
}

impl Query {
    /// Parse and type-check a query expression
    pub fn parse(input: &str) -> Result<Self> {
        let cleaned = strip_decorations(input);
        if cleaned.chars().all(|c| c.is_whitespace() || c == '₹') {
            return Err(FilterError::Empty);
        }
        check_nesting(&cleaned)?;

        let mut pairs = QueryParser::parse(Rule::query, &cleaned).map_err(syntax_error)?;
        match pairs.next() {
            Some(pair) => build_query(pair),
            None => Err(FilterError::Empty),
        }
    }

    /// Select, sort and truncate. Input order is preserved among equal keys.
    pub fn apply<'a>(&self, dishes: &'a [Dish]) -> Vec<&'a Dish> {
        let mut rows: Vec<&Dish> = dishes
            .iter()
            .filter(|d| self.selection.as_ref().map_or(true, |p| p.matches(d)))
            .collect();

        if let Some(key) = self.order {
            rows.sort_by(|a, b| {
                let ord = sort_cmp(key.field, a, b);
                if key.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }

        rows
    }
}

fn sort_cmp(field: Field, a: &Dish, b: &Dish) -> Ordering {
    match (field.value_of(a), field.value_of(b)) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (FieldValue::Number(x), FieldValue::Number(y)) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Dietary(x), FieldValue::Dietary(y)) => x.as_str().cmp(y.as_str()),
        (FieldValue::Spice(x), FieldValue::Spice(y)) => x.cmp(&y),
        (FieldValue::Tags(x), FieldValue::Tags(y)) => x.len().cmp(&y.len()),
        _ => Ordering::Equal,
    }
}

/// Drop comment lines and markdown fences the model may wrap around the query
fn strip_decorations(input: &str) -> String {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("```"))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches('`')
        .to_string()
}

/// Deepest bracket or negation nesting a query may use
pub const MAX_NESTING: usize = 32;

#[derive(pest_derive::Parser)]
#[grammar = "catalog/query.pest"]
struct QueryParser;

/// Reject runaway bracket nesting before the recursive grammar sees it
fn check_nesting(input: &str) -> Result<()> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in input.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(FilterError::TooDeep(MAX_NESTING));
                }
            }
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn syntax_error(error: pest::error::Error<Rule>) -> FilterError {
    let error = error.renamed_rules(describe_rule);
    let column = match error.line_col {
        LineColLocation::Pos((_, col)) | LineColLocation::Span((_, col), _) => col,
    };
    FilterError::Syntax {
        column,
        message: error.variant.message().into_owned(),
    }
}

fn describe_rule(rule: &Rule) -> String {
    let name = match rule {
        Rule::EOI => "end of query",
        Rule::or_expr | Rule::and_expr | Rule::unary | Rule::comparison => "a condition",
        Rule::field => "a field name",
        Rule::literal | Rule::string | Rule::number | Rule::ident => "a value",
        Rule::cmp_op | Rule::set_test => "a comparison operator",
        Rule::list => "a list",
        Rule::not_op | Rule::kw_not | Rule::bang => "NOT",
        Rule::kw_all => "ALL",
        Rule::kw_and => "AND",
        Rule::kw_or => "OR",
        Rule::kw_in => "IN",
        Rule::kw_contains => "CONTAINS",
        Rule::order_clause | Rule::kw_order => "ORDER BY",
        Rule::kw_by => "BY",
        Rule::kw_asc => "ASC",
        Rule::kw_desc => "DESC",
        Rule::limit_clause | Rule::kw_limit => "LIMIT",
        other => return format!("{:?}", other),
    };
    name.to_string()
}

fn column_of(pair: &Pair<'_, Rule>) -> usize {
    pair.as_span().start_pos().line_col().1
}

fn malformed(column: usize, expected: &str) -> FilterError {
    FilterError::Syntax {
        column,
        message: format!("expected {}", expected),
    }
}

/// Single-element groups collapse to the element itself
fn combine(mut parts: Vec<Predicate>, join: fn(Vec<Predicate>) -> Predicate) -> Predicate {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        join(parts)
    }
}

fn build_query(pair: Pair<'_, Rule>) -> Result<Query> {
    let mut query = Query {
        selection: None,
        order: None,
        limit: None,
    };
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::or_expr => query.selection = Some(build_or(part)?),
            Rule::order_clause => query.order = Some(build_order(part)?),
            Rule::limit_clause => query.limit = Some(build_limit(part)?),
            _ => {}
        }
    }
    Ok(query)
}

fn build_or(pair: Pair<'_, Rule>) -> Result<Predicate> {
    let parts = pair
        .into_inner()
        .map(build_and)
        .collect::<Result<Vec<_>>>()?;
    Ok(combine(parts, Predicate::Any))
}

fn build_and(pair: Pair<'_, Rule>) -> Result<Predicate> {
    let parts = pair
        .into_inner()
        .map(build_unary)
        .collect::<Result<Vec<_>>>()?;
    Ok(combine(parts, Predicate::All))
}

fn build_unary(pair: Pair<'_, Rule>) -> Result<Predicate> {
    let column = column_of(&pair);
    let mut negations = 0usize;
    let mut inner = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::not_op => {
                negations += 1;
                if negations > MAX_NESTING {
                    return Err(FilterError::TooDeep(MAX_NESTING));
                }
            }
            Rule::or_expr => inner = Some(build_or(part)?),
            Rule::comparison => inner = Some(build_comparison(part)?),
            _ => {}
        }
    }

    let inner = inner.ok_or_else(|| malformed(column, "a condition"))?;
    // Double negation cancels out
    Ok(if negations % 2 == 1 {
        Predicate::Not(Box::new(inner))
    } else {
        inner
    })
}

fn build_comparison(pair: Pair<'_, Rule>) -> Result<Predicate> {
    let column = column_of(&pair);
    let mut parts = pair.into_inner();
    let (Some(field), Some(test)) = (parts.next(), parts.next()) else {
        return Err(malformed(column, "a comparison"));
    };
    let field = build_field(field)?;

    if test.as_rule() == Rule::set_test {
        return build_set_test(field, test);
    }

    let op = match test.as_str() {
        "==" | "=" => Operator::Eq,
        "!=" | "<>" => Operator::Ne,
        "<" => Operator::Lt,
        "<=" => Operator::Le,
        ">" => Operator::Gt,
        ">=" => Operator::Ge,
        _ => return Err(malformed(column, "a comparison operator")),
    };
    if !field.supports(op) {
        return Err(FilterError::UnsupportedOperator { field, op });
    }

    let literal = parts
        .next()
        .ok_or_else(|| malformed(column, "a value"))?;
    let value = typed_value(field, build_literal(literal)?)?;
    Ok(Predicate::Compare(Comparison { field, op, value }))
}

/// `[NOT] IN list` and `[NOT] CONTAINS value`
fn build_set_test(field: Field, pair: Pair<'_, Rule>) -> Result<Predicate> {
    let column = column_of(&pair);
    let mut negated = false;
    let mut op = None;
    let mut operand = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::kw_not => negated = true,
            Rule::kw_in => op = Some(Operator::In),
            Rule::kw_contains => op = Some(Operator::Contains),
            Rule::list | Rule::literal => operand = Some(part),
            _ => {}
        }
    }

    let (Some(op), Some(operand)) = (op, operand) else {
        return Err(malformed(column, "IN or CONTAINS"));
    };
    if !field.supports(op) {
        return Err(FilterError::UnsupportedOperator { field, op });
    }

    let value = if operand.as_rule() == Rule::list {
        Value::List(
            operand
                .into_inner()
                .map(|item| build_literal(item).and_then(|lit| typed_value(field, lit)))
                .collect::<Result<Vec<_>>>()?,
        )
    } else {
        typed_value(field, build_literal(operand)?)?
    };

    let comparison = Predicate::Compare(Comparison { field, op, value });
    Ok(if negated {
        Predicate::Not(Box::new(comparison))
    } else {
        comparison
    })
}

/// Column names may be bare or quoted
fn build_field(pair: Pair<'_, Rule>) -> Result<Field> {
    let name = match pair.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::string => string_text(inner),
        Some(inner) => inner.as_str().to_string(),
        None => String::new(),
    };
    Field::from_name(&name).ok_or(FilterError::UnknownField(name))
}

fn build_literal(pair: Pair<'_, Rule>) -> Result<Literal> {
    let column = column_of(&pair);
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| malformed(column, "a value"))?;
    match inner.as_rule() {
        Rule::string => Ok(Literal::Text(string_text(inner))),
        Rule::number => parse_number(inner.as_str()).map(Literal::Number),
        _ => Ok(Literal::Text(inner.as_str().to_string())),
    }
}

fn build_order(pair: Pair<'_, Rule>) -> Result<SortKey> {
    let column = column_of(&pair);
    let mut field = None;
    let mut descending = false;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::field => field = Some(build_field(part)?),
            Rule::kw_desc => descending = true,
            _ => {}
        }
    }

    let field = field.ok_or_else(|| malformed(column, "a field name"))?;
    Ok(SortKey { field, descending })
}

fn build_limit(pair: Pair<'_, Rule>) -> Result<usize> {
    let text = pair
        .into_inner()
        .find(|part| part.as_rule() == Rule::number)
        .map(|part| part.as_str().to_string())
        .unwrap_or_default();
    match parse_number(&text) {
        Ok(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
        _ => Err(FilterError::InvalidLimit(text)),
    }
}

fn parse_number(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| FilterError::InvalidNumber(text.to_string()))
}

/// Contents of a quoted string with backslash escapes resolved
fn string_text(pair: Pair<'_, Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or_default();
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                text.push(escaped);
            }
        } else {
            text.push(c);
        }
    }
    text
}

/// Untyped literal as written in the query
enum Literal {
    Text(String),
    Number(f64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "\"{}\"", s),
            Literal::Number(n) => write!(f, "{}", n),
        }
    }
}

fn typed_value(field: Field, literal: Literal) -> Result<Value> {
    match (field.kind(), literal) {
        (FieldKind::Text | FieldKind::Tags, Literal::Text(s)) => Ok(Value::Text(s)),
        (FieldKind::Number, Literal::Number(n)) => Ok(Value::Number(n)),
        (FieldKind::Number, Literal::Text(s)) => match s.trim().parse::<f64>() {
            Ok(n) => typed_value(field, Literal::Number(n)),
            Err(_) => Err(FilterError::TypeMismatch {
                field,
                expected: "a number",
                found: format!("\"{}\"", s),
            }),
        },
        (FieldKind::Dietary, Literal::Text(s)) => s
            .parse::<Dietary>()
            .map(Value::Dietary)
            .map_err(|e| FilterError::InvalidValue {
                field,
                reason: e.to_string(),
            }),
        (FieldKind::Spice, Literal::Text(s)) => s
            .parse::<SpiceLevel>()
            .map(Value::Spice)
            .map_err(|e| FilterError::InvalidValue {
                field,
                reason: e.to_string(),
            }),
        (_, lit) => Err(FilterError::TypeMismatch {
            field,
            expected: "text",
            found: lit.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::seed_dishes;

    fn names(query: &str) -> Vec<String> {
        let dishes = seed_dishes();
        Query::parse(query)
            .unwrap()
            .apply(&dishes)
            .into_iter()
            .map(|d| d.name.clone())
            .collect()
    }

    #[test]
    fn test_vegetarian_desserts() {
        assert_eq!(
            names(r#"dietary == "Vegetarian" AND category == "Dessert""#),
            vec!["Chocolate Brownie", "Gulab Jamun"]
        );
    }

    #[test]
    fn test_numeric_and_case_insensitive_text() {
        assert_eq!(
            names("cuisine = 'chinese' and price < 200"),
            vec!["Veg Hakka Noodles"]
        );
    }

    #[test]
    fn test_or_with_parentheses_and_not() {
        let result = names(
            r#"(cuisine == "Italian" OR cuisine == "Thai") AND NOT dietary == "Non-Vegetarian""#,
        );
        assert_eq!(result, vec!["Margherita Pizza"]);
    }

    #[test]
    fn test_spice_levels_are_ordered() {
        let result = names(r#"spice_level >= "High""#);
        assert_eq!(
            result,
            vec!["Fish Curry", "Chicken Wings", "Mutton Rogan Josh"]
        );
    }

    #[test]
    fn test_in_list_and_tags() {
        assert_eq!(
            names(r#"restaurant IN ["South Spice", "Sweet Tooth"] AND tags CONTAINS "healthy""#),
            vec!["Masala Dosa", "Idli Sambar"]
        );
        assert_eq!(names(r#"tags == "Cooling""#), vec!["Mango Lassi"]);
    }

    #[test]
    fn test_not_in() {
        let result = names(r#"category NOT IN ["Main Course", "Appetizer"]"#);
        assert_eq!(
            result,
            vec!["Chocolate Brownie", "Gulab Jamun", "Mango Lassi"]
        );
    }

    #[test]
    fn test_order_and_limit() {
        assert_eq!(
            names(r#"category == "Dessert" ORDER BY rating DESC LIMIT 1"#),
            vec!["Chocolate Brownie"]
        );
        assert_eq!(
            names("ORDER BY price ASC LIMIT 2"),
            vec!["Gulab Jamun", "Mango Lassi"]
        );
        assert_eq!(names("ALL").len(), 20);
    }

    #[test]
    fn test_rating_equality() {
        assert_eq!(
            names("rating == 4.4"),
            vec!["Paneer Tikka Masala", "Gulab Jamun", "Pad Thai"]
        );
    }

    #[test]
    fn test_comments_fences_and_currency_are_ignored() {
        let query = "```\n# cheap vegetarian food\ndietary == Vegetarian AND price <= ₹100\n```";
        assert_eq!(
            names(query),
            vec!["Gulab Jamun", "Idli Sambar", "Mango Lassi"]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(Query::parse("   ").unwrap_err(), FilterError::Empty);
        assert_eq!(Query::parse("# only a comment").unwrap_err(), FilterError::Empty);
        assert!(matches!(
            Query::parse("calories < 500").unwrap_err(),
            FilterError::UnknownField(_)
        ));
        assert!(matches!(
            Query::parse("price CONTAINS 5").unwrap_err(),
            FilterError::UnsupportedOperator { .. }
        ));
        assert!(matches!(
            Query::parse("price < cheap").unwrap_err(),
            FilterError::TypeMismatch { .. }
        ));
        assert!(matches!(
            Query::parse("dietary == 'Pescatarian'").unwrap_err(),
            FilterError::InvalidValue { .. }
        ));
        assert!(matches!(
            Query::parse("name == 'Dosa").unwrap_err(),
            FilterError::Syntax { .. }
        ));
        assert!(matches!(
            Query::parse("food_df[food_df['cuisine'] == 'Chinese']").unwrap_err(),
            FilterError::Syntax { .. }
        ));
        assert_eq!(
            Query::parse("price < 200 LIMIT -1").unwrap_err(),
            FilterError::InvalidLimit("-1".to_string())
        );
        assert!(matches!(
            Query::parse("price < 200 extra").unwrap_err(),
            FilterError::Syntax { .. }
        ));
    }

    #[test]
    fn test_syntax_error_reports_column() {
        let err = Query::parse("price <").unwrap_err();
        let FilterError::Syntax { column, message } = err else {
            panic!("expected a syntax error, got {:?}", err);
        };
        assert_eq!(column, 8);
        assert!(message.contains("value"), "{}", message);
    }

    #[test]
    fn test_keywords_need_word_boundaries() {
        assert!(matches!(
            Query::parse("notes == 'x'").unwrap_err(),
            FilterError::UnknownField(name) if name == "notes"
        ));
        assert!(matches!(
            Query::parse("ordering == 'x'").unwrap_err(),
            FilterError::UnknownField(name) if name == "ordering"
        ));
        assert_eq!(names("NOT NOT cuisine == 'Thai'"), names("cuisine == 'Thai'"));
    }

    #[test]
    fn test_escaped_quotes_in_strings() {
        let query = Query::parse(r#"name == 'Chef\'s Special'"#).unwrap();
        let Some(Predicate::Compare(cmp)) = query.selection else {
            panic!("expected a single comparison");
        };
        assert_eq!(cmp.value, Value::Text("Chef's Special".to_string()));
    }

    #[test]
    fn test_nesting_within_limit_is_accepted() {
        let query = format!(
            "{}price < 100{}",
            "(".repeat(MAX_NESTING),
            ")".repeat(MAX_NESTING)
        );
        assert_eq!(names(&query), names("price < 100"));

        let negated = format!("{}price < 100", "NOT ".repeat(MAX_NESTING));
        assert_eq!(names(&negated), names("price < 100"));
    }

    #[test]
    fn test_runaway_nesting_is_rejected() {
        let deep = 10_000;
        let cases = [
            format!("{}price < 100{}", "(".repeat(deep), ")".repeat(deep)),
            format!("{}price < 100", "(".repeat(deep)),
            format!("{}price < 100", "!".repeat(deep)),
            format!("{}price < 100", "NOT ".repeat(deep)),
            format!("restaurant IN {}", "[".repeat(deep)),
        ];
        for query in &cases {
            assert_eq!(
                Query::parse(query).unwrap_err(),
                FilterError::TooDeep(MAX_NESTING)
            );
        }

        // Brackets inside strings do not count
        let quoted = format!("name == '{}'", "(".repeat(deep));
        assert!(Query::parse(&quoted).is_ok());
    }
}
