//! Field names, attribute names and class names shared across the workspace.
//!
//! These are part of the wire contract with the content service and the
//! authoring host, so they must not change independently.

/// Discriminant field on a model
pub const TYPE_PROP: &str = ":type";
/// Child map of a container model
pub const ITEMS_PROP: &str = ":items";
/// Ordered child keys of a container model
pub const ITEMS_ORDER_PROP: &str = ":itemsOrder";
/// Resource path of a model
pub const PATH_PROP: &str = ":path";

/// Props-side names, after the model→props transform
pub const CQ_TYPE: &str = "cqType";
pub const CQ_ITEMS: &str = "cqItems";
pub const CQ_ITEMS_ORDER: &str = "cqItemsOrder";
pub const CQ_PATH: &str = "cqPath";
pub const IS_IN_EDITOR: &str = "isInEditor";
pub const NO_DECORATION: &str = "aemNoDecoration";
pub const CSS_CLASS_NAMES: &str = "cssClassNames";
pub const CONTAINER_PROPS: &str = "containerProps";
pub const COLUMN_CLASS_NAMES: &str = "columnClassNames";
pub const CQ_COLUMN_CLASS_NAMES: &str = "cqColumnClassNames";

/// DOM attributes read by the authoring host
pub const DATA_PATH_ATTR: &str = "data-cq-data-path";
pub const DATA_RESOURCE_TYPE_ATTR: &str = "data-cq-resource-type";
pub const DATA_EMPTY_TEXT_ATTR: &str = "data-emptytext";

pub const CONTAINER_CLASS_NAMES: &str = "aem-container";
pub const PLACEHOLDER_CLASS_NAMES: &str = "cq-placeholder";
pub const NEW_SECTION_CLASS_NAMES: &str = "new section";

/// Name of the host event fired once a node's content has been injected
pub const ASYNC_CONTENT_LOADED_EVENT: &str = "cq-async-content-loaded";
