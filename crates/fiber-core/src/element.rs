//! Element descriptors: the immutable description of what a render wants.
//!
//! Everything here is reference counted so descriptions can be cloned into
//! fibers (`pending_props`, `memoized_props`) without copying subtrees.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::hooks::Hooks;

/// Diff identity of a child among its siblings.
pub type Key = Rc<str>;

type RenderFn = dyn Fn(&mut Hooks<'_>, &Props) -> Node;

struct ComponentInner {
    name: &'static str,
    render: Box<RenderFn>,
}

/// A function component.
///
/// Two components are the same type only when they are the same handle, so
/// a component should be created once and cloned (see `#[component]`).
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    pub fn new(
        name: &'static str,
        render: impl Fn(&mut Hooks<'_>, &Props) -> Node + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ComponentInner {
                name,
                render: Box::new(render),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub(crate) fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Node {
        (self.inner.render)(hooks, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.inner.name).finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    /// A host tag such as `"div"`.
    Host(Rc<str>),
    Component(Component),
}

impl ElementType {
    pub fn is_host(&self) -> bool {
        matches!(self, ElementType::Host(_))
    }

    pub fn name(&self) -> &str {
        match self {
            ElementType::Host(tag) => tag,
            ElementType::Component(component) => component.name(),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(Rc::from(tag))
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

impl From<&Component> for ElementType {
    fn from(component: &Component) -> Self {
        ElementType::Component(component.clone())
    }
}

/// Event handler stored in props. Compared by identity.
pub type Callback = Rc<dyn Fn()>;

#[derive(Clone)]
pub enum PropValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Callback(Callback),
    /// Arbitrary data handed to a function component. Compared by identity.
    Any(Rc<dyn Any>),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            PropValue::Callback(callback) => Some(callback),
            _ => None,
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            PropValue::Any(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Callback(a), PropValue::Callback(b)) => Rc::ptr_eq(a, b),
            (PropValue::Any(a), PropValue::Any(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => write!(f, "{value:?}"),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Callback(_) => f.write_str("<callback>"),
            PropValue::Any(_) => f.write_str("<any>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Callback> for PropValue {
    fn from(value: Callback) -> Self {
        PropValue::Callback(value)
    }
}

#[derive(Clone, Default)]
struct PropsData {
    attributes: IndexMap<Rc<str>, PropValue>,
    children: Node,
}

/// Attributes plus children, in insertion order.
#[derive(Clone, Default)]
pub struct Props {
    inner: Rc<PropsData>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.inner.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.inner
            .attributes
            .iter()
            .map(|(name, value)| (&**name, value))
    }

    pub fn children(&self) -> &Node {
        &self.inner.children
    }

    pub fn with_attr(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.inner)
            .attributes
            .insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: impl Into<Node>) -> Self {
        Rc::make_mut(&mut self.inner).children = children.into();
        self
    }

    fn take_attr(&mut self, name: &str) -> Option<PropValue> {
        if !self.inner.attributes.contains_key(name) {
            return None;
        }
        Rc::make_mut(&mut self.inner).attributes.shift_remove(name)
    }

    /// Attribute-wise comparison; children are ignored since they are
    /// reconciled as fibers, not host attributes.
    pub fn attributes_eq(&self, other: &Props) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) || self.inner.attributes == other.inner.attributes
    }

    pub fn ptr_eq(&self, other: &Props) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attributes", &self.inner.attributes)
            .field("children", &self.inner.children)
            .finish()
    }
}

/// The shape a child slot may take.
#[derive(Clone, Debug, Default)]
pub enum Node {
    /// Renders nothing (null / boolean children).
    #[default]
    Empty,
    Text(Rc<str>),
    Element(Element),
    List(Rc<[Node]>),
}

impl Node {
    pub fn text(text: impl Into<Rc<str>>) -> Self {
        Node::Text(text.into())
    }

    /// Build a list, flattening nested lists into one level.
    pub fn list(children: impl IntoIterator<Item = Node>) -> Self {
        let mut flat = Vec::new();
        for child in children {
            match child {
                Node::List(nested) => flat.extend(nested.iter().cloned()),
                other => flat.push(other),
            }
        }
        Node::List(flat.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::text(text)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::text(value.to_string())
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::text(value.to_string())
    }
}

impl From<usize> for Node {
    fn from(value: usize) -> Self {
        Node::text(value.to_string())
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Node::list(children)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Empty, Into::into)
    }
}

impl FromIterator<Node> for Node {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Node::list(iter)
    }
}

/// Collapse positional children into one slot value: none stays empty, one
/// is the bare child, several become a list. Holes keep their index.
fn collapse_children(mut children: Vec<Node>) -> Node {
    match children.len() {
        0 => Node::Empty,
        1 => children.remove(0),
        _ => Node::list(children),
    }
}

#[derive(Clone, Debug)]
pub struct Element {
    ty: ElementType,
    key: Option<Key>,
    props: Props,
    /// Slots added through `child`, including empty ones.
    slots: Vec<Node>,
}

impl Element {
    pub fn new(ty: impl Into<ElementType>, key: Option<Key>, props: Props) -> Self {
        let slots = match props.children() {
            Node::Empty => Vec::new(),
            Node::List(items) => items.to_vec(),
            single => vec![single.clone()],
        };
        Self {
            ty: ty.into(),
            key,
            props,
            slots,
        }
    }

    pub fn host(tag: &str) -> Self {
        Self::new(tag, None, Props::new())
    }

    pub fn component(component: &Component) -> Self {
        Self::new(component, None, Props::new())
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn attr(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        self.props = self.props.with_attr(name, value);
        self
    }

    /// Append one positional child. An empty child still takes a slot, so
    /// `.child(flag.then(..))` keeps later siblings at stable indices.
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.slots.push(child.into());
        self.props = self
            .props
            .with_children(collapse_children(self.slots.clone()));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.slots = children.into_iter().collect();
        self.props = self.props.with_children(Node::list(self.slots.clone()));
        self
    }

    pub fn element_type(&self) -> &ElementType {
        &self.ty
    }

    pub fn key_ref(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }
}

/// Element factory for authoring layers.
///
/// A `key` attribute becomes the element key. One child collapses to the bare
/// child, several become a list, none leaves `children` empty.
pub fn create_element(
    ty: impl Into<ElementType>,
    props: Props,
    children: impl IntoIterator<Item = Node>,
) -> Element {
    let mut props = props;
    let key = props.take_attr("key").and_then(|value| match value {
        PropValue::Str(key) => Some(key),
        PropValue::Int(key) => Some(Rc::from(key.to_string())),
        _ => None,
    });
    let children: Vec<Node> = children.into_iter().collect();
    let children = if children.is_empty() {
        props.children().clone()
    } else {
        collapse_children(children)
    };
    Element::new(ty, key, props.with_children(children))
}
