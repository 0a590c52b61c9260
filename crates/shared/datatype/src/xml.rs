//! XML value selection.
//!
//! Supports the path subset needed for record mapping: `/name` (child),
//! `//name` (descendant), `*` (any element) and a trailing `@attr`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::convert::parse_bool;
use crate::error::{DatatypeError, DatatypeResult};

/// Record selector plus the per-field selectors evaluated inside each record.
#[derive(Debug, Clone)]
pub struct XmlMapping {
    root: String,
    fields: Vec<(String, String)>,
}

impl XmlMapping {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            fields: Vec::new(),
        }
    }

    /// Map `key` to the values selected by `selector` within a record.
    pub fn field(mut self, key: impl Into<String>, selector: impl Into<String>) -> Self {
        self.fields.push((key.into(), selector.into()));
        self
    }
}

/// Text of the first node matched by `selector`.
pub fn get_xml_value(xml: &str, selector: &str) -> DatatypeResult<String> {
    let doc = Document::parse(xml)?;
    let steps = parse_selector(selector)?;
    doc.select(&doc.top(), &steps)
        .into_iter()
        .next()
        .map(|m| doc.text_of(&m))
        .ok_or_else(|| DatatypeError::NodeNotFound(selector.to_string()))
}

/// Extract one JSON object per record node.
///
/// Multiple matches for a field are joined with `,`. Values are typed as
/// integer, float or bool when they parse as such; `t` and `f` stay strings.
/// Records without any matched field are skipped.
pub fn parse_xml_records(xml: &str, mapping: &XmlMapping) -> DatatypeResult<Vec<Map<String, Value>>> {
    let doc = Document::parse(xml)?;
    let root = parse_selector(&mapping.root)?;
    let fields = mapping
        .fields
        .iter()
        .map(|(key, selector)| Ok((key.as_str(), parse_selector(selector)?)))
        .collect::<DatatypeResult<Vec<_>>>()?;

    let mut records = Vec::new();
    for matched in doc.select(&doc.top(), &root) {
        let Matched::Element(record) = matched else {
            return Err(DatatypeError::Xml(format!(
                "record selector \"{}\" must select elements",
                mapping.root
            )));
        };
        let mut object = Map::new();
        for (key, steps) in &fields {
            let values: Vec<String> = doc
                .select(&[record], steps)
                .iter()
                .map(|m| doc.text_of(m))
                .collect();
            if !values.is_empty() {
                object.insert((*key).to_string(), typed_value(values.join(",")));
            }
        }
        if !object.is_empty() {
            records.push(object);
        }
    }
    Ok(records)
}

/// Deserialize the first mapped record.
pub fn parse_xml_to<T: DeserializeOwned>(xml: &str, mapping: &XmlMapping) -> DatatypeResult<T> {
    let first = parse_xml_records(xml, mapping)?
        .into_iter()
        .next()
        .ok_or_else(|| DatatypeError::NodeNotFound(mapping.root.clone()))?;
    serde_json::from_value(Value::Object(first)).map_err(|e| DatatypeError::Decode(e.to_string()))
}

/// Deserialize every mapped record.
pub fn parse_xml_to_vec<T: DeserializeOwned>(xml: &str, mapping: &XmlMapping) -> DatatypeResult<Vec<T>> {
    parse_xml_records(xml, mapping)?
        .into_iter()
        .map(|record| {
            serde_json::from_value(Value::Object(record))
                .map_err(|e| DatatypeError::Decode(e.to_string()))
        })
        .collect()
}

fn typed_value(raw: String) -> Value {
    if raw.eq_ignore_ascii_case("t") || raw.eq_ignore_ascii_case("f") {
        return Value::String(raw);
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    if let Ok(flag) = parse_bool(&raw) {
        return Value::Bool(flag);
    }
    Value::String(raw)
}

// =============================================================================
// Selector
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Name(String),
    Any,
    Attribute(String),
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NodeTest,
}

fn parse_selector(selector: &str) -> DatatypeResult<Vec<Step>> {
    let invalid = || DatatypeError::Xml(format!("invalid selector \"{selector}\""));
    let mut rest = selector;
    let mut steps = Vec::new();
    while !rest.is_empty() {
        let axis = if let Some(tail) = rest.strip_prefix("//") {
            rest = tail;
            Axis::Descendant
        } else if let Some(tail) = rest.strip_prefix('/') {
            rest = tail;
            Axis::Child
        } else {
            return Err(invalid());
        };
        let end = rest.find('/').unwrap_or(rest.len());
        let token = &rest[..end];
        rest = &rest[end..];
        let test = match token {
            "" => return Err(invalid()),
            "*" => NodeTest::Any,
            _ => match token.strip_prefix('@') {
                Some("") => return Err(invalid()),
                Some(name) => NodeTest::Attribute(name.to_string()),
                None => NodeTest::Name(token.to_string()),
            },
        };
        steps.push(Step { axis, test });
    }
    let attribute_not_last = steps
        .iter()
        .rev()
        .skip(1)
        .any(|s| matches!(s.test, NodeTest::Attribute(_)));
    if steps.is_empty() || attribute_not_last {
        return Err(invalid());
    }
    Ok(steps)
}

// =============================================================================
// Document
// =============================================================================

#[derive(Debug)]
enum Node {
    Element(usize),
    Text(String),
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Matched {
    Element(usize),
    Attribute(String),
}

/// Element arena; index 0 is the document node and indices follow document order.
struct Document {
    elements: Vec<Element>,
}

impl Document {
    fn parse(xml: &str) -> DatatypeResult<Self> {
        let xml_err = |e: &dyn std::fmt::Display| DatatypeError::Xml(e.to_string());
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut elements = vec![Element::default()];
        let mut open = vec![0usize];
        loop {
            match reader.read_event().map_err(|e| xml_err(&e))? {
                Event::Start(start) => {
                    let index = Self::push(&mut elements, &open, &start)?;
                    open.push(index);
                }
                Event::Empty(start) => {
                    Self::push(&mut elements, &open, &start)?;
                }
                Event::End(_) => {
                    if open.len() == 1 {
                        return Err(DatatypeError::Xml("unbalanced end tag".into()));
                    }
                    open.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| xml_err(&e))?.into_owned();
                    Self::push_text(&mut elements, &open, text);
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    Self::push_text(&mut elements, &open, text);
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if open.len() != 1 {
            return Err(DatatypeError::Xml("unexpected end of document".into()));
        }
        Ok(Self { elements })
    }

    fn push(elements: &mut Vec<Element>, open: &[usize], start: &BytesStart<'_>) -> DatatypeResult<usize> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| DatatypeError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| DatatypeError::Xml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        let index = elements.len();
        elements.push(Element {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        });
        if let Some(parent) = open.last() {
            elements[*parent].children.push(Node::Element(index));
        }
        Ok(index)
    }

    fn push_text(elements: &mut [Element], open: &[usize], text: String) {
        if let Some(parent) = open.last() {
            elements[*parent].children.push(Node::Text(text));
        }
    }

    /// Top-level elements of the document.
    fn top(&self) -> Vec<usize> {
        self.child_elements(0)
    }

    fn child_elements(&self, index: usize) -> Vec<usize> {
        self.elements[index]
            .children
            .iter()
            .filter_map(|child| match child {
                Node::Element(i) => Some(*i),
                Node::Text(_) => None,
            })
            .collect()
    }

    /// Descendants of `index` in document order, walked with an explicit stack.
    fn descendants(&self, index: usize, out: &mut Vec<usize>) {
        let mut stack: Vec<usize> = self.child_elements(index).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.child_elements(node).into_iter().rev());
        }
    }

    fn inner_text(&self, index: usize, out: &mut String) {
        let mut stack: Vec<&Node> = self.elements[index].children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(i) => stack.extend(self.elements[*i].children.iter().rev()),
            }
        }
    }

    fn text_of(&self, matched: &Matched) -> String {
        match matched {
            Matched::Attribute(value) => value.clone(),
            Matched::Element(index) => {
                let mut text = String::new();
                self.inner_text(*index, &mut text);
                text
            }
        }
    }

    /// Evaluate `steps` as if `top` were the children of a document node.
    fn select(&self, top: &[usize], steps: &[Step]) -> Vec<Matched> {
        let mut current: Vec<usize> = Vec::new();
        for (position, step) in steps.iter().enumerate() {
            let mut candidates = Vec::new();
            match (position, step.axis) {
                (0, Axis::Child) => candidates.extend_from_slice(top),
                (0, Axis::Descendant) => {
                    for &node in top {
                        candidates.push(node);
                        self.descendants(node, &mut candidates);
                    }
                }
                (_, Axis::Child) => {
                    for &node in &current {
                        candidates.extend(self.child_elements(node));
                    }
                }
                (_, Axis::Descendant) => {
                    for &node in &current {
                        self.descendants(node, &mut candidates);
                    }
                }
            }

            if let NodeTest::Attribute(name) = &step.test {
                // The owner set for an attribute step is the context itself.
                let owners = match (position, step.axis) {
                    (0, Axis::Child) => Vec::new(),
                    (0, Axis::Descendant) => candidates,
                    (_, Axis::Child) => current,
                    (_, Axis::Descendant) => {
                        let mut all = current.clone();
                        all.extend(candidates);
                        all
                    }
                };
                return self
                    .in_document_order(owners)
                    .into_iter()
                    .filter_map(|owner| {
                        self.elements[owner]
                            .attributes
                            .iter()
                            .find(|(key, _)| key == name)
                            .map(|(_, value)| Matched::Attribute(value.clone()))
                    })
                    .collect();
            }

            candidates.retain(|&i| match &step.test {
                NodeTest::Name(name) => &self.elements[i].name == name,
                _ => true,
            });
            current = self.in_document_order(candidates);
        }
        current.into_iter().map(Matched::Element).collect()
    }

    fn in_document_order(&self, mut nodes: Vec<usize>) -> Vec<usize> {
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const USERS: &str = r#"<users count="2"><user firstName="Walter" lastName="White" age="50" gender="male" company="T"><postal code="91764"><street address="Villa Gaeta"><email>walter.white@example.com</email><animal pet="cat"></animal></street></postal></user><user firstName="James" lastName="McGill" age="45" gender="male" company="S"><postal code="65782"><street address="Saul Street"><email>james.mcgill@example.com</email><animal pet="dog"></animal></street></postal></user></users>"#;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        first_name: String,
        last_name: String,
        age: u8,
        gender: String,
        company: String,
        email: String,
        pet: String,
        street: String,
        postal_code: i64,
    }

    fn mapping() -> XmlMapping {
        XmlMapping::new("//users/user")
            .field("first_name", "//user/@firstName")
            .field("last_name", "//user/@lastName")
            .field("age", "//user/@age")
            .field("gender", "//user/@gender")
            .field("company", "//user/@company")
            .field("email", "//user/postal/street/email")
            .field("pet", "//user/postal/street/animal/@pet")
            .field("street", "//user/postal/street/@address")
            .field("postal_code", "//user/postal/@code")
    }

    #[test]
    fn maps_every_record() {
        let users: Vec<User> = parse_xml_to_vec(USERS, &mapping()).unwrap();
        assert_eq!(
            users,
            vec![
                User {
                    first_name: "Walter".into(),
                    last_name: "White".into(),
                    age: 50,
                    gender: "male".into(),
                    company: "T".into(),
                    email: "walter.white@example.com".into(),
                    pet: "cat".into(),
                    street: "Villa Gaeta".into(),
                    postal_code: 91764,
                },
                User {
                    first_name: "James".into(),
                    last_name: "McGill".into(),
                    age: 45,
                    gender: "male".into(),
                    company: "S".into(),
                    email: "james.mcgill@example.com".into(),
                    pet: "dog".into(),
                    street: "Saul Street".into(),
                    postal_code: 65782,
                },
            ]
        );
    }

    #[test]
    fn first_record_only() {
        let user: User = parse_xml_to(USERS, &mapping()).unwrap();
        assert_eq!(user.first_name, "Walter");
    }

    #[test]
    fn multiple_matches_are_joined() {
        let records = parse_xml_records(
            USERS,
            &XmlMapping::new("/users").field("names", "//user/@firstName"),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["names"], Value::String("Walter,James".into()));
    }

    #[test]
    fn get_value_by_attribute() {
        let raw = get_xml_value(USERS, "//users/@count").unwrap();
        assert_eq!(raw.parse::<i32>().unwrap(), 2);
        assert_eq!(
            get_xml_value(USERS, "//user/postal/street/email").unwrap(),
            "walter.white@example.com"
        );
    }

    #[test]
    fn missing_node_is_an_error() {
        assert_eq!(
            get_xml_value(USERS, "//nothing"),
            Err(DatatypeError::NodeNotFound("//nothing".into()))
        );
    }

    #[test]
    fn wildcard_and_child_axis() {
        let email = get_xml_value(USERS, "/users/*/postal/street/email").unwrap();
        assert_eq!(email, "walter.white@example.com");
    }

    #[test]
    fn invalid_selectors() {
        assert!(matches!(get_xml_value(USERS, "users"), Err(DatatypeError::Xml(_))));
        assert!(matches!(get_xml_value(USERS, "//@a/b"), Err(DatatypeError::Xml(_))));
        assert!(matches!(get_xml_value(USERS, "//a//"), Err(DatatypeError::Xml(_))));
    }

    #[test]
    fn malformed_xml() {
        assert!(matches!(
            get_xml_value("<a><b></a>", "//a"),
            Err(DatatypeError::Xml(_))
        ));
    }

    #[test]
    fn deep_nesting_is_walked_without_recursion() {
        let depth = 200_000;
        let xml = format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth));

        assert_eq!(get_xml_value(&xml, "//a").unwrap(), "x");

        let records = parse_xml_records(&xml, &XmlMapping::new("/a").field("text", "/a")).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn unclosed_document() {
        assert!(matches!(
            get_xml_value("<a><b>text</b>", "//b"),
            Err(DatatypeError::Xml(_))
        ));
        assert!(matches!(
            get_xml_value("<a></a></a>", "//a"),
            Err(DatatypeError::Xml(_))
        ));
    }

    #[test]
    fn value_typing() {
        assert_eq!(typed_value("12".into()), Value::from(12));
        assert_eq!(typed_value("1.5".into()), Value::from(1.5));
        assert_eq!(typed_value("true".into()), Value::Bool(true));
        assert_eq!(typed_value("t".into()), Value::String("t".into()));
        assert_eq!(typed_value("NaN".into()), Value::String("NaN".into()));
        assert_eq!(typed_value("text".into()), Value::String("text".into()));
    }
}
