//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use semantic_model_mcp::models::CreateSemanticModelRequest;
use semantic_model_mcp::{
    ApiResponse, FabricApi, FabricError, RequestBody, TmdlFiles, TmdlValidator, ValidationResult,
    ValidatorError,
};

type Responder<T> = Box<dyn Fn() -> Result<T, FabricError> + Send + Sync>;

/// Calls observed by [`RecordingFabric`].
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub create: usize,
    pub update: usize,
    pub refresh: usize,
    pub refresh_types: Vec<String>,
    pub posts: Vec<(String, RequestBody)>,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.create + self.update + self.refresh + self.posts.len()
    }
}

/// [`FabricApi`] fake with scripted outcomes for every operation.
pub struct RecordingFabric {
    create: Responder<String>,
    update: Responder<bool>,
    refresh: Responder<bool>,
    post: Responder<ApiResponse>,
    calls: Mutex<Calls>,
}

impl Default for RecordingFabric {
    fn default() -> Self {
        Self {
            create: Box::new(|| Ok("model-123".to_string())),
            update: Box::new(|| Ok(true)),
            refresh: Box::new(|| Ok(true)),
            post: Box::new(|| Ok(ApiResponse::new(200, "{}"))),
            calls: Mutex::new(Calls::default()),
        }
    }
}

impl RecordingFabric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(mut self, f: impl Fn() -> Result<String, FabricError> + Send + Sync + 'static) -> Self {
        self.create = Box::new(f);
        self
    }

    pub fn on_update(mut self, f: impl Fn() -> Result<bool, FabricError> + Send + Sync + 'static) -> Self {
        self.update = Box::new(f);
        self
    }

    pub fn on_refresh(mut self, f: impl Fn() -> Result<bool, FabricError> + Send + Sync + 'static) -> Self {
        self.refresh = Box::new(f);
        self
    }

    pub fn on_post(mut self, f: impl Fn() -> Result<ApiResponse, FabricError> + Send + Sync + 'static) -> Self {
        self.post = Box::new(f);
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FabricApi for RecordingFabric {
    async fn get(&self, _path: &str) -> Result<ApiResponse, FabricError> {
        Ok(ApiResponse::new(200, "{}"))
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<ApiResponse, FabricError> {
        self.calls.lock().unwrap().posts.push((path.to_string(), body));
        (self.post)()
    }

    async fn patch(&self, _path: &str, _body: RequestBody) -> Result<ApiResponse, FabricError> {
        Ok(ApiResponse::new(200, ""))
    }

    async fn delete(&self, _path: &str) -> Result<ApiResponse, FabricError> {
        Ok(ApiResponse::new(200, ""))
    }

    async fn create_semantic_model(
        &self,
        _request: &CreateSemanticModelRequest,
    ) -> Result<String, FabricError> {
        self.calls.lock().unwrap().create += 1;
        (self.create)()
    }

    async fn update_semantic_model(&self, _model_id: &str, _files: &TmdlFiles) -> Result<bool, FabricError> {
        self.calls.lock().unwrap().update += 1;
        (self.update)()
    }

    async fn refresh_semantic_model(&self, _model_id: &str, refresh_type: &str) -> Result<bool, FabricError> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.refresh += 1;
            calls.refresh_types.push(refresh_type.to_string());
        }
        (self.refresh)()
    }
}

/// [`TmdlValidator`] fake returning a fixed result, or failing.
pub struct FakeValidator {
    result: Option<ValidationResult>,
    calls: Mutex<usize>,
}

impl FakeValidator {
    pub fn returning(result: ValidationResult) -> Self {
        Self {
            result: Some(result),
            calls: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TmdlValidator for FakeValidator {
    async fn validate(&self, _files: &TmdlFiles) -> Result<ValidationResult, ValidatorError> {
        *self.calls.lock().unwrap() += 1;
        match &self.result {
            Some(result) => Ok(result.clone()),
            None => Err(ValidatorError::Workspace(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "scratch directory is read-only",
            ))),
        }
    }
}

/// A two-file model definition.
pub fn sample_files() -> TmdlFiles {
    let mut files = BTreeMap::new();
    files.insert(
        "model.tmdl".to_string(),
        "model Model\n\tculture: en-US\n".to_string(),
    );
    files.insert(
        "tables/Sales.tmdl".to_string(),
        "table Sales\n\tcolumn Amount\n\t\tdataType: decimal\n".to_string(),
    );
    files
}

/// A `Status` error as produced by a rejected request.
pub fn status_error(status: u16, reason: &str) -> FabricError {
    FabricError::Status {
        status,
        reason: reason.to_string(),
    }
}
