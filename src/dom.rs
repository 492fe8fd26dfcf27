use scraper::{ElementRef, Html};

// ============================================================================
// TYPED DOM QUERIES
// ============================================================================
//
// Thin query layer over the parsed HTML tree. Extractors match elements by
// tag/class/attribute predicates through `Query` instead of string selectors,
// so none of them depend on a selector syntax.

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

/// Handle to one element in a parsed document.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    el: ElementRef<'a>,
}

/// Element predicate: tag membership, class token/fragment, attribute presence.
/// An empty query matches every element.
#[derive(Debug, Clone, Default)]
pub struct Query {
    tags: Vec<&'static str>,
    class_token: Option<&'static str>,
    class_fragment: Option<&'static str>,
    attr_present: Option<&'static str>,
}

impl Query {
    /// Matches any element.
    pub fn any() -> Query {
        Query::default()
    }

    /// Matches elements with the given tag name.
    pub fn tag(tag: &'static str) -> Query {
        Query {
            tags: vec![tag],
            ..Query::default()
        }
    }

    /// Matches elements whose tag is any of the given names.
    pub fn tags(tags: &[&'static str]) -> Query {
        Query {
            tags: tags.to_vec(),
            ..Query::default()
        }
    }

    /// Requires an exact class token (e.g. `winner` in `class="top_area winner"`).
    pub fn with_class(mut self, token: &'static str) -> Query {
        self.class_token = Some(token);
        self
    }

    /// Requires the class attribute to contain the given fragment anywhere.
    pub fn with_class_fragment(mut self, fragment: &'static str) -> Query {
        self.class_fragment = Some(fragment);
        self
    }

    /// Requires the named attribute to be present (any value).
    pub fn with_attr(mut self, name: &'static str) -> Query {
        self.attr_present = Some(name);
        self
    }

    fn matches(&self, el: &ElementRef) -> bool {
        let element = el.value();

        if !self.tags.is_empty() && !self.tags.iter().any(|t| element.name().eq_ignore_ascii_case(t)) {
            return false;
        }

        if let Some(token) = self.class_token {
            let found = element
                .attr("class")
                .map(|c| c.split_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }

        if let Some(fragment) = self.class_fragment {
            let found = element
                .attr("class")
                .map(|c| c.to_lowercase().contains(&fragment.to_lowercase()))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }

        if let Some(name) = self.attr_present {
            if element.attr(name).is_none() {
                return false;
            }
        }

        true
    }
}

impl Document {
    /// Parses an HTML string into a queryable document.
    pub fn parse(html: &str) -> Document {
        Document {
            html: Html::parse_document(html),
        }
    }

    /// Returns the document's root element.
    pub fn root(&self) -> Node<'_> {
        Node {
            el: self.html.root_element(),
        }
    }

    /// Returns every element in the document matching the query, in document order.
    pub fn find_all(&self, query: &Query) -> Vec<Node<'_>> {
        self.root().find_all(query)
    }

    /// Returns the first element matching the query, if any.
    pub fn find_first(&self, query: &Query) -> Option<Node<'_>> {
        self.root().find_first(query)
    }
}

impl<'a> Node<'a> {
    /// Lowercased tag name.
    pub fn tag(&self) -> &'a str {
        self.el.value().name()
    }

    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.el.value().attr(name)
    }

    /// Whether the class attribute contains the fragment (case-insensitive).
    pub fn class_contains(&self, fragment: &str) -> bool {
        self.attr("class")
            .map(|c| c.to_lowercase().contains(&fragment.to_lowercase()))
            .unwrap_or(false)
    }

    /// All text under this element, whitespace-collapsed and trimmed.
    pub fn text(&self) -> String {
        let raw = self.el.text().collect::<String>();
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Descendant elements matching the query, in document order.
    pub fn find_all(&self, query: &Query) -> Vec<Node<'a>> {
        self.el
            .descendants()
            .skip(1) // descendants() starts with self
            .filter_map(ElementRef::wrap)
            .filter(|el| query.matches(el))
            .map(|el| Node { el })
            .collect()
    }

    /// First descendant element matching the query.
    pub fn find_first(&self, query: &Query) -> Option<Node<'a>> {
        self.el
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| query.matches(el))
            .map(|el| Node { el })
    }

    /// Parent element, if this element has one.
    pub fn parent(&self) -> Option<Node<'a>> {
        self.el
            .parent()
            .and_then(ElementRef::wrap)
            .map(|el| Node { el })
    }

    /// Preceding sibling elements, nearest first.
    pub fn prev_elements(&self) -> Vec<Node<'a>> {
        self.el
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .map(|el| Node { el })
            .collect()
    }

    /// Direct child elements, in document order.
    pub fn children(&self) -> Vec<Node<'a>> {
        self.el
            .children()
            .filter_map(ElementRef::wrap)
            .map(|el| Node { el })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
