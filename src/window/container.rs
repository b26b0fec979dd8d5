use crate::error::ContainerFault;

/// A DOM-like element that may serve as the rendering canvas.
///
/// Elements are handles: cloning one refers to the same element.
pub trait CanvasElement: Clone {
    /// Uppercase tag name, e.g. `"CANVAS"`.
    fn tag_name(&self) -> String;

    /// The element id, empty if none.
    fn id(&self) -> String;

    /// Sets the element id.
    fn set_id(&self, id: &str);

    /// Whether this element is a canvas.
    fn is_canvas(&self) -> bool {
        self.tag_name().eq_ignore_ascii_case("canvas")
    }
}

/// Element lookup by id.
pub trait Document {
    /// The element type.
    type Element: CanvasElement;

    /// The element with the given id, if any.
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
}

/// Where the viewer should mount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Container<E> {
    /// The id of a canvas element.
    Id(String),
    /// A canvas element.
    Element(E),
}

impl<E> From<&str> for Container<E> {
    fn from(id: &str) -> Self {
        Container::Id(id.to_string())
    }
}

impl<E> From<String> for Container<E> {
    fn from(id: String) -> Self {
        Container::Id(id)
    }
}

/// Resolves `container` to a canvas and its id.
///
/// A canvas without id is given a random one, so it can be looked up later.
pub fn resolve_canvas<D: Document>(
    document: &D,
    container: Container<D::Element>,
) -> Result<(String, D::Element), ContainerFault> {
    match container {
        Container::Element(element) => {
            if !element.is_canvas() {
                return Err(ContainerFault::NotCanvas {
                    tag: element.tag_name(),
                });
            }

            let mut id = element.id();
            if id.is_empty() {
                id = format!("fz3d-{:08x}", rand::random::<u32>());
                element.set_id(&id);
            }
            Ok((id, element))
        }
        Container::Id(id) => {
            let element = document
                .element_by_id(&id)
                .ok_or_else(|| ContainerFault::NotFound(id.clone()))?;
            if !element.is_canvas() {
                return Err(ContainerFault::NotCanvas {
                    tag: element.tag_name(),
                });
            }
            Ok((id, element))
        }
    }
}
