use crate::element::Element;

/// Node payload of a [`MolGraph`](crate::MolGraph).
///
/// Only the element is carried: isomorphism, fragment matching and family
/// templates all compare atoms by species alone.
///
/// # Examples
///
/// ```
/// use rxnet::{Atom, Element};
///
/// let li = Atom::new(Element::Li);
/// assert_eq!(li.element.symbol(), "Li");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom {
    pub element: Element,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn specie(&self) -> &'static str {
        self.element.symbol()
    }
}

impl From<Element> for Atom {
    fn from(element: Element) -> Self {
        Self::new(element)
    }
}
