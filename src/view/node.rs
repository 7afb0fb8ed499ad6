use std::fmt;

/// A rendered element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Heading { level: u8, text: String },
    Button { id: String, label: String },
    Fragment(Vec<Node>),
}

impl Node {
    /// Heading of `level` (1 is the largest).
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Node::Heading {
            level,
            text: text.into(),
        }
    }

    /// Clickable control addressed by `id`.
    pub fn button(id: impl Into<String>, label: impl Into<String>) -> Self {
        Node::Button {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Depth-first search for the button with `id`.
    pub fn find_button(&self, id: &str) -> Option<&Node> {
        match self {
            Node::Button { id: own, .. } if own == id => Some(self),
            Node::Fragment(children) => children.iter().find_map(|child| child.find_button(id)),
            _ => None,
        }
    }

    /// Ids of all buttons, in document order.
    pub fn button_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.walk(&mut |node| {
            if let Node::Button { id, .. } = node {
                ids.push(id.as_str());
            }
        });
        ids
    }

    /// Text of all headings and button labels, in document order.
    pub fn texts(&self) -> Vec<&str> {
        let mut texts = Vec::new();
        self.walk(&mut |node| match node {
            Node::Heading { text, .. } => texts.push(text.as_str()),
            Node::Button { label, .. } => texts.push(label.as_str()),
            Node::Fragment(_) => {}
        });
        texts
    }

    fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        if let Node::Fragment(children) = self {
            for child in children {
                child.walk(visit);
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Heading { level, text } => {
                writeln!(f, "{} {}", "#".repeat(usize::from(*level)), text)
            }
            Node::Button { id, label } => writeln!(f, "[{label}] ({id})"),
            Node::Fragment(children) => children.iter().try_for_each(|child| write!(f, "{child}")),
        }
    }
}
