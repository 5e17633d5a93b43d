#![allow(clippy::doc_markdown)] // README uses "OpenAPI" proper noun throughout
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod descriptor;

pub use descriptor::{
    AuthScheme, Catalog, FieldInfo, GroupDescriptor, HandlerAnnotation, HandlerDescriptor,
    HttpMethod, ParamAnnotation, ParamDescriptor, ParamSource, ReturnDescriptor, SourceInfo,
    TriggerInfo, TypeInfo, VirtualParam,
};
