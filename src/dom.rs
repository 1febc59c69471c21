//! A small document tree standing in for the host document.
//!
//! Drawings are plain [`Element`] trees. Nodes shared with the host (the attachment target and
//! the drawing root) live behind [`NodeRef`] handles so the renderer can fill a root that the
//! host already holds.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;

use crate::error::{StylingError, StylingResult};

// Node
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Ref(NodeRef),
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<NodeRef> for Node {
    fn from(r: NodeRef) -> Self {
        Self::Ref(r)
    }
}

impl Node {
    fn any_ref(&self, f: &mut impl FnMut(&NodeRef) -> bool) -> bool {
        match self {
            Self::Element(el) => el.children.iter().any(|c| c.any_ref(f)),
            Self::Text(_) => false,
            Self::Ref(r) => f(r),
        }
    }

    fn write_xml(&self, out: &mut String) {
        match self {
            Self::Element(el) => el.write_xml(out),
            Self::Text(t) => escape_into(t, false, out),
            Self::Ref(r) => r.0.lock().write_xml(out),
        }
    }
}

// Element
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attrs: Vec::new(), children: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Depth-first search over owned descendants, shared nodes are not entered.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut res = Vec::new();
        self.collect(name, &mut res);
        res
    }

    fn collect<'a>(&'a self, name: &str, res: &mut Vec<&'a Element>) {
        for child in &self.children {
            if let Node::Element(el) = child {
                if el.name == name {
                    res.push(el);
                }
                el.collect(name, res);
            }
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            escape_into(v, true, out);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_xml(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn escape_into(s: &str, attr: bool, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod element_tests {
    use super::{Element, Node};

    #[test]
    fn test_to_xml() {
        let el = Element::new("g")
            .attr("fill", "#000")
            .child(Element::new("rect").attr("x", 1.5).attr("y", 0))
            .child(Node::Text("a < b & \"c\"".into()));
        assert_eq!(el.to_xml(), r##"<g fill="#000"><rect x="1.5" y="0"/>a &lt; b &amp; "c"</g>"##);
    }

    #[test]
    fn test_attr_escaped_and_replaced() {
        let mut el = Element::new("image").attr("href", "a\"b");
        assert_eq!(el.to_xml(), r#"<image href="a&quot;b"/>"#);
        el.set_attr("href", "c");
        assert_eq!(el.get_attr("href"), Some("c"));
        assert_eq!(el.to_xml(), r#"<image href="c"/>"#);
    }

    #[test]
    fn test_find_all() {
        let el = Element::new("svg")
            .child(Element::new("g").child(Element::new("rect")).child(Element::new("rect")))
            .child(Element::new("rect"));
        assert_eq!(el.find_all("rect").len(), 3);
        assert_eq!(el.find_all("circle").len(), 0);
    }
}

// Shared node
//------------------------------------------------------------------------------

/// Shared handle to a node of the host document.
#[derive(Clone)]
pub struct NodeRef(Arc<Mutex<Node>>);

impl NodeRef {
    pub fn new(node: impl Into<Node>) -> Self {
        Self(Arc::new(Mutex::new(node.into())))
    }

    pub fn element(name: &str) -> Self {
        Self::new(Element::new(name))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Node::Text(text.into()))
    }

    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Only elements can hold children.
    pub fn accepts_children(&self) -> bool {
        matches!(*self.0.lock(), Node::Element(_))
    }

    pub fn child_count(&self) -> usize {
        match &*self.0.lock() {
            Node::Element(el) => el.children.len(),
            _ => 0,
        }
    }

    /// Appends `child`. Fails for nodes that can't hold children and for appends that would
    /// make the tree cyclic.
    pub fn append_child(&self, child: impl Into<Node>) -> StylingResult<()> {
        let child = child.into();
        if child.any_ref(&mut |r| r.reaches(self)) {
            return Err(StylingError::InvalidTarget);
        }
        match &mut *self.0.lock() {
            Node::Element(el) => {
                el.children.push(child);
                Ok(())
            }
            _ => Err(StylingError::InvalidTarget),
        }
    }

    /// Detaches the shared node `child` from this node's direct children. Returns whether
    /// anything was removed.
    pub fn remove_child(&self, child: &NodeRef) -> bool {
        match &mut *self.0.lock() {
            Node::Element(el) => {
                let before = el.children.len();
                el.children.retain(|c| !matches!(c, Node::Ref(r) if r.ptr_eq(child)));
                el.children.len() != before
            }
            _ => false,
        }
    }

    /// Whether appending `child` here would make the tree cyclic.
    pub fn is_within(&self, child: &NodeRef) -> bool {
        child.reaches(self)
    }

    pub fn clear_children(&self) {
        self.replace_children(Vec::new());
    }

    pub fn replace_children(&self, children: Vec<Node>) {
        if let Node::Element(el) = &mut *self.0.lock() {
            el.children = children;
        }
    }

    /// Runs `f` with the node locked.
    pub fn with<R>(&self, f: impl FnOnce(&Node) -> R) -> R {
        f(&self.0.lock())
    }

    pub fn contains(&self, other: &NodeRef) -> bool {
        self.0.lock().any_ref(&mut |r| r.reaches(other))
    }

    fn reaches(&self, target: &NodeRef) -> bool {
        if self.ptr_eq(target) {
            return true;
        }
        self.0.lock().any_ref(&mut |r| r.reaches(target))
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.0.lock().write_xml(&mut out);
        out
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&Arc::as_ptr(&self.0)).finish()
    }
}

#[cfg(test)]
mod node_ref_tests {
    use super::{Element, NodeRef};
    use crate::error::StylingError;

    #[test]
    fn test_append_and_clear() {
        let body = NodeRef::element("div");
        body.append_child(Element::new("span")).unwrap();
        body.append_child(NodeRef::element("p")).unwrap();
        assert_eq!(body.child_count(), 2);
        assert_eq!(body.to_xml(), "<div><span/><p/></div>");
        body.clear_children();
        assert_eq!(body.child_count(), 0);
        assert_eq!(body.to_xml(), "<div/>");
    }

    #[test]
    fn test_text_rejects_children() {
        let text = NodeRef::text("hello");
        assert!(!text.accepts_children());
        assert_eq!(text.append_child(Element::new("svg")), Err(StylingError::InvalidTarget));
        assert_eq!(text.to_xml(), "hello");
    }

    #[test]
    fn test_shared_child_reflects_updates() {
        let host = NodeRef::element("div");
        let root = NodeRef::element("svg");
        host.append_child(root.clone()).unwrap();
        root.append_child(Element::new("rect")).unwrap();
        assert_eq!(host.to_xml(), "<div><svg><rect/></svg></div>");
        assert!(host.contains(&root));
        assert!(!root.contains(&host));
    }

    #[test]
    fn test_remove_child() {
        let host = NodeRef::element("div");
        let root = NodeRef::element("svg");
        host.append_child(Element::new("span")).unwrap();
        host.append_child(root.clone()).unwrap();
        assert!(host.remove_child(&root));
        assert!(!host.remove_child(&root));
        assert_eq!(host.to_xml(), "<div><span/></div>");
        assert!(!NodeRef::text("t").remove_child(&root));
    }

    #[test]
    fn test_cycles_rejected() {
        let a = NodeRef::element("g");
        let b = NodeRef::element("g");
        assert!(a.is_within(&a));
        assert_eq!(a.append_child(a.clone()), Err(StylingError::InvalidTarget));
        a.append_child(b.clone()).unwrap();
        assert!(b.is_within(&a));
        assert!(!a.is_within(&b));
        assert_eq!(b.append_child(a.clone()), Err(StylingError::InvalidTarget));
        assert_eq!(b.append_child(Element::new("g").child(a.clone())), Err(StylingError::InvalidTarget));
    }
}
