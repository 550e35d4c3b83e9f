use std::collections::BTreeMap;

use hcl::{Expression, Identifier, Object, ObjectKey, Traversal, TraversalOperator, Variable};
use rand::Rng;
use tracing::debug;

/// Key wrapping each secret's fields, read back by the resource's dynamic block.
pub const FIELDS_KEY: &str = "fields";

const LOCALS_ROOT: &str = "local";
const SECRETS_ATTR: &str = "secrets";

const SECRET_PREFIX: &str = "secret-";
const FIELD_PREFIX: &str = "field-";
const CRN_PREFIX: &str = "crn:v1:bluemix:";

// Same range as a non-negative signed 64 bit integer.
const MAX_PLACEHOLDER: u64 = i64::MAX as u64;

pub type FieldsMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct SecretEntry {
    pub fields: FieldsMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretsMapping {
    entries: BTreeMap<String, SecretEntry>,
}

impl SecretsMapping {
    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn get(&self, name: &str) -> Option<&SecretEntry> {
        return self.entries.get(name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SecretEntry)> {
        return self.entries.iter();
    }

    /// Object value bound to `local.secrets`:
    /// `{ secret-N = { fields = { field-X = "crn:..." } } }`.
    pub fn to_expression(&self) -> Expression {
        let secrets: Object<ObjectKey, Expression> = self
            .entries
            .iter()
            .map(|(name, entry)| {
                let fields: Object<ObjectKey, Expression> = entry
                    .fields
                    .iter()
                    .map(|(field, crn)| (object_key(field), Expression::String(crn.clone())))
                    .collect();

                let mut wrapper = Object::new();
                wrapper.insert(object_key(FIELDS_KEY), Expression::Object(fields));
                return (object_key(name), Expression::Object(wrapper));
            })
            .collect();

        return Expression::Object(secrets);
    }
}

/// Attribute name the locals block binds the mapping to.
pub fn secrets_attribute() -> &'static str {
    return SECRETS_ATTR;
}

/// `local.secrets`, the reference other documents use to reach the mapping.
pub fn secrets_reference() -> Traversal {
    return Traversal::builder(Variable::sanitized(LOCALS_ROOT))
        .attr(Identifier::sanitized(SECRETS_ATTR))
        .build();
}

/// `local.secrets[<key>].fields`, the fields of one secret picked by `key`.
pub fn secret_fields_reference(key: impl Into<Expression>) -> Traversal {
    let mut traversal = secrets_reference();
    traversal.operators.push(TraversalOperator::Index(key.into()));
    traversal
        .operators
        .push(TraversalOperator::GetAttr(Identifier::sanitized(FIELDS_KEY)));
    return traversal;
}

/// Builds `secret_count` placeholder secrets with `field_count` distinct fields each.
///
/// A field name drawn twice for the same secret is drawn again rather than
/// overwriting the earlier value.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    secret_count: usize,
    field_count: usize,
) -> SecretsMapping {
    let mut entries = BTreeMap::new();

    for index in 0..secret_count {
        let mut fields = FieldsMap::new();
        while fields.len() < field_count {
            let name = format!("{}{}", FIELD_PREFIX, rng.gen_range(0..=MAX_PLACEHOLDER));
            if fields.contains_key(&name) {
                debug!(field = %name, "field name collision, drawing again");
                continue;
            }
            let crn = format!("{}{}", CRN_PREFIX, rng.gen_range(0..=MAX_PLACEHOLDER));
            fields.insert(name, crn);
        }

        entries.insert(format!("{}{}", SECRET_PREFIX, index), SecretEntry { fields });
    }

    debug!(
        secrets = entries.len(),
        fields_per_secret = field_count,
        "generated placeholder secrets"
    );
    return SecretsMapping { entries };
}

// Keys that are valid identifiers are written bare, anything else as a quoted string.
fn object_key(key: &str) -> ObjectKey {
    if is_identifier(key) {
        return ObjectKey::Identifier(Identifier::sanitized(key));
    }
    return ObjectKey::Expression(Expression::String(key.to_string()));
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    return chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
}
