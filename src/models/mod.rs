mod api_docs;

pub use api_docs::{
    Documentation, DocumentationEntry, ParameterSpec, RequestBody, RequestBodySpec, ResponseSpec,
};
