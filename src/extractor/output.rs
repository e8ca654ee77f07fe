use html_escape::{encode_double_quoted_attribute, encode_text};

use super::tagging::VOID_ELEMENTS;

pub type NodeIdx = usize;

#[derive(Debug)]
enum Kind {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug)]
struct OutNode {
    kind: Kind,
    children: Vec<NodeIdx>,
}

/// Shallow-clone tree built during the classification walk.
///
/// Nodes are only ever appended as the last child of their parent, so a node
/// that turns out empty on exit is still its parent's last child and can be
/// detached with a pop.
#[derive(Debug)]
pub struct OutputTree {
    nodes: Vec<OutNode>,
}

impl OutputTree {
    pub fn new(root: &str) -> Self {
        Self {
            nodes: vec![OutNode {
                kind: Kind::Element {
                    name: root.to_string(),
                    attrs: Vec::new(),
                },
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeIdx {
        0
    }

    pub fn append_element<'a>(
        &mut self,
        parent: NodeIdx,
        name: &str,
        attrs: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> NodeIdx {
        let attrs = attrs.map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.push(
            parent,
            Kind::Element {
                name: name.to_string(),
                attrs,
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeIdx, text: &str) {
        self.push(parent, Kind::Text(text.to_string()));
    }

    pub fn has_children(&self, node: NodeIdx) -> bool {
        !self.nodes[node].children.is_empty()
    }

    /// Detaches `node`, which must be the most recently appended child of `parent`.
    pub fn detach_last(&mut self, parent: NodeIdx, node: NodeIdx) {
        let children = &mut self.nodes[parent].children;
        debug_assert_eq!(children.last(), Some(&node));
        if children.last() == Some(&node) {
            children.pop();
        }
    }

    fn push(&mut self, parent: NodeIdx, kind: Kind) -> NodeIdx {
        let idx = self.nodes.len();
        self.nodes.push(OutNode {
            kind,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write(self.root(), &mut out);
        out
    }

    fn write(&self, idx: NodeIdx, out: &mut String) {
        let node = &self.nodes[idx];
        match &node.kind {
            Kind::Text(text) => out.push_str(&encode_text(text)),
            Kind::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&encode_double_quoted_attribute(v));
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }

                for &child in &node.children {
                    self.write(child, out);
                }

                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}
