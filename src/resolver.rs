//! Reference closure and dependency ordering of named schemas.

use std::collections::{BTreeMap, BTreeSet};

use crate::deserializer::Schema;

/// Schema names a field-level schema refers to, following array items.
/// Inline objects map to `HashMap<String, Value>` so their properties are not followed.
pub fn field_references(schema: &Schema, out: &mut BTreeSet<String>) {
    if let Some(name) = schema.ref_name() {
        out.insert(name.to_string());
    } else if let Some(items) = &schema.items {
        field_references(items, out);
    }
}

/// Direct dependencies of a named schema: its properties, array items and composition
/// members. Includes the schema itself if it is self-referencing.
pub fn dependencies(schema: &Schema) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_dependencies(schema, &mut out);
    out
}

fn collect_dependencies(schema: &Schema, out: &mut BTreeSet<String>) {
    field_references(schema, out);
    for property in schema.properties.values() {
        field_references(property, out);
    }
    for member in schema.compositions() {
        collect_dependencies(member, out);
    }
}

/// The schemas reachable from a set of starting names
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Closure {
    /// Reachable names declared in the document
    pub names: BTreeSet<String>,
    /// Reachable names that have no declaration
    pub dangling: BTreeSet<String>,
}

/// Collects every schema reachable from `start` through [`dependencies`].
/// Visits each schema once so cyclic references terminate.
pub fn collect_closure<I, S>(start: I, schemas: &BTreeMap<String, Schema>) -> Closure
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut closure = Closure::default();
    let mut stack = start.into_iter().map(Into::into).collect::<Vec<String>>();
    while let Some(name) = stack.pop() {
        if closure.names.contains(&name) || closure.dangling.contains(&name) {
            continue;
        }
        match schemas.get(&name) {
            Some(schema) => {
                stack.extend(
                    dependencies(schema)
                        .into_iter()
                        .filter(|dep| !closure.names.contains(dep)),
                );
                closure.names.insert(name);
            }
            None => {
                closure.dangling.insert(name);
            }
        }
    }
    closure
}

/// The schemas that could not be ordered because they depend on each other
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle(pub Vec<String>);

/// Orders `names` so every schema comes after the schemas it depends on.
/// Self-references and names outside the set are not ordering constraints. Each pass
/// walks the remaining names alphabetically and emits those whose dependencies are done.
pub fn order_for_emission(
    names: &BTreeSet<String>,
    schemas: &BTreeMap<String, Schema>,
) -> Result<Vec<String>, Cycle> {
    let deps = names
        .iter()
        .map(|name| {
            let deps = schemas
                .get(name)
                .map(dependencies)
                .unwrap_or_default()
                .into_iter()
                .filter(|dep| dep != name && names.contains(dep))
                .collect::<BTreeSet<_>>();
            (name.as_str(), deps)
        })
        .collect::<BTreeMap<_, _>>();

    let mut ordered = Vec::with_capacity(names.len());
    let mut remaining = names.iter().map(String::as_str).collect::<BTreeSet<_>>();
    while !remaining.is_empty() {
        let before = remaining.len();
        for name in remaining.clone() {
            let ready = deps
                .get(name)
                .map_or(true, |deps| deps.iter().all(|d| !remaining.contains(d.as_str())));
            if ready {
                ordered.push(name.to_string());
                remaining.remove(name);
            }
        }
        if remaining.len() == before {
            return Err(Cycle(remaining.into_iter().map(String::from).collect()));
        }
    }
    Ok(ordered)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schemas(yaml: &str) -> BTreeMap<String, Schema> {
        serde_yaml::from_str(yaml).unwrap()
    }

    const CHAIN: &str = r##"
Subscription:
  type: object
  properties:
    plan:
      $ref: '#/components/schemas/Plan'
    regions:
      type: array
      items:
        $ref: '#/components/schemas/Region'
Plan:
  type: object
  properties:
    tier:
      $ref: '#/components/schemas/Tier'
Tier:
  type: string
  enum: [free, paid]
Region:
  type: object
  properties:
    name:
      type: string
Unrelated:
  type: object
"##;

    #[test]
    fn test_closure_follows_properties_and_items() {
        let schemas = schemas(CHAIN);
        let closure = collect_closure(["Subscription"], &schemas);
        assert_eq!(
            closure.names.into_iter().collect::<Vec<_>>(),
            vec!["Plan", "Region", "Subscription", "Tier"]
        );
        assert!(closure.dangling.is_empty());
    }

    #[test]
    fn test_closure_follows_compositions_and_reports_dangling() {
        let schemas = schemas(
            r##"
Pet:
  oneOf:
    - $ref: '#/components/schemas/Cat'
    - $ref: '#/components/schemas/Ghost'
Cat:
  allOf:
    - $ref: '#/components/schemas/Animal'
Animal:
  type: object
"##,
        );
        let closure = collect_closure(["Pet"], &schemas);
        assert_eq!(
            closure.names.into_iter().collect::<Vec<_>>(),
            vec!["Animal", "Cat", "Pet"]
        );
        assert_eq!(closure.dangling.into_iter().collect::<Vec<_>>(), vec!["Ghost"]);
    }

    #[test]
    fn test_dependency_order() {
        let schemas = schemas(CHAIN);
        let names = collect_closure(["Subscription"], &schemas).names;
        let order = order_for_emission(&names, &schemas).unwrap();
        assert_eq!(order.len(), names.len());
        let position = |n: &str| order.iter().position(|o| o == n).unwrap();
        for name in &order {
            for dep in dependencies(&schemas[name]) {
                if names.contains(&dep) {
                    assert!(position(&dep) < position(name), "{dep} before {name}");
                }
            }
        }
        assert_eq!(order, vec!["Region", "Tier", "Plan", "Subscription"]);
    }

    #[test]
    fn test_self_reference_is_not_a_cycle() {
        let schemas = schemas(
            r##"
Node:
  type: object
  properties:
    children:
      type: array
      items:
        $ref: '#/components/schemas/Node'
"##,
        );
        let closure = collect_closure(["Node"], &schemas);
        assert_eq!(order_for_emission(&closure.names, &schemas), Ok(vec!["Node".to_string()]));
    }

    #[test]
    fn test_cycle_is_reported() {
        let schemas = schemas(
            r##"
A:
  type: object
  properties:
    b:
      $ref: '#/components/schemas/B'
B:
  type: object
  properties:
    a:
      $ref: '#/components/schemas/A'
C:
  type: object
"##,
        );
        let names = collect_closure(["A", "C"], &schemas).names;
        assert_eq!(
            order_for_emission(&names, &schemas),
            Err(Cycle(vec!["A".to_string(), "B".to_string()]))
        );
    }
}
