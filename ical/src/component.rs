// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Owned component tree shared by the parser and the formatter.

/// A calendar component such as VCALENDAR or VEVENT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Component name, upper-cased (e.g., "VCALENDAR", "VEVENT")
    pub name: String,
    /// Properties in original order
    pub properties: Vec<Property>,
    /// Nested child components
    pub children: Vec<Component>,
}

impl Component {
    /// Create an empty component.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append a property, builder style.
    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Append a child component, builder style.
    #[must_use]
    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    /// Whether the component has the given name, ignoring ASCII case.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First property with the given name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.is(name))
    }

    /// All properties with the given name, in order.
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |p| p.is(name))
    }

    /// Child components with the given name, in order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Component> {
        self.children.iter().filter(move |c| c.is(name))
    }
}

/// A property: name, parameters and the raw (escaped) value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name as written, compared case-insensitively
    pub name: String,
    /// Property parameters (allow duplicates & multi-values)
    pub parameters: Vec<Parameter>,
    /// Raw property value, escaping preserved
    pub value: String,
}

impl Property {
    /// Create a property without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            value: value.into(),
        }
    }

    /// Append a single-valued parameter, builder style.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            values: vec![value.into()],
        });
        self
    }

    /// Whether the property has the given name, ignoring ASCII case.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First value of the named parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(|p| p.values.first())
            .map(String::as_str)
    }
}

/// A parameter (e.g., `TZID=Europe/Berlin`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name (e.g., "TZID", "VALUE")
    pub name: String,
    /// Parameter values split by commas, unquoted
    pub values: Vec<String>,
}
