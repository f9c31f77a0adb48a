//! Single-purpose entry points for the presentation layer.
//!
//! Each use case wraps one repository call. They exist so callers depend on
//! an intent (`SearchContes`) rather than on the whole repository surface.

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::{Conte, Devinette, DevinetteAnswer};
use crate::outcome::Outcome;
use crate::storage::{CatalogRepository, RiddleRepository};

#[async_trait]
pub trait UseCase<Params: Send + 'static>: Send + Sync {
    type Output: Send;

    async fn call(&self, params: Params) -> Outcome<Self::Output>;
}

/// Marker for use cases that take no input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParams;

pub type ConteRepo = Arc<dyn CatalogRepository<Conte>>;
pub type RiddleRepo = Arc<dyn RiddleRepository>;

pub struct GetAllContes {
    repository: ConteRepo,
}

impl GetAllContes {
    pub fn new(repository: ConteRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<NoParams> for GetAllContes {
    type Output = Vec<Conte>;

    async fn call(&self, _params: NoParams) -> Outcome<Vec<Conte>> {
        self.repository.get_all().await
    }
}

pub struct GetConteById {
    repository: ConteRepo,
}

impl GetConteById {
    pub fn new(repository: ConteRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<String> for GetConteById {
    type Output = Conte;

    async fn call(&self, id: String) -> Outcome<Conte> {
        self.repository.get_by_id(&id).await
    }
}

pub struct SearchContes {
    repository: ConteRepo,
}

impl SearchContes {
    pub fn new(repository: ConteRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<String> for SearchContes {
    type Output = Vec<Conte>;

    async fn call(&self, query: String) -> Outcome<Vec<Conte>> {
        self.repository.search(&query).await
    }
}

pub struct GetContesByCategory {
    repository: ConteRepo,
}

impl GetContesByCategory {
    pub fn new(repository: ConteRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<String> for GetContesByCategory {
    type Output = Vec<Conte>;

    async fn call(&self, category: String) -> Outcome<Vec<Conte>> {
        self.repository.get_by_category(&category).await
    }
}

pub struct DownloadConte {
    repository: ConteRepo,
}

impl DownloadConte {
    pub fn new(repository: ConteRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<String> for DownloadConte {
    type Output = ();

    async fn call(&self, id: String) -> Outcome<()> {
        self.repository.download(&id).await
    }
}

pub struct GetFreeContes {
    repository: ConteRepo,
}

impl GetFreeContes {
    pub fn new(repository: ConteRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<NoParams> for GetFreeContes {
    type Output = Vec<Conte>;

    async fn call(&self, _params: NoParams) -> Outcome<Vec<Conte>> {
        self.repository.get_free().await
    }
}

pub struct GetPremiumContes {
    repository: ConteRepo,
}

impl GetPremiumContes {
    pub fn new(repository: ConteRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<NoParams> for GetPremiumContes {
    type Output = Vec<Conte>;

    async fn call(&self, _params: NoParams) -> Outcome<Vec<Conte>> {
        self.repository.get_premium().await
    }
}

pub struct GetAllDevinettes {
    repository: RiddleRepo,
}

impl GetAllDevinettes {
    pub fn new(repository: RiddleRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<NoParams> for GetAllDevinettes {
    type Output = Vec<Devinette>;

    async fn call(&self, _params: NoParams) -> Outcome<Vec<Devinette>> {
        self.repository.get_all().await
    }
}

#[derive(Debug, Clone)]
pub struct HintParams {
    pub devinette_id: String,
    pub index: usize,
}

pub struct GetHint {
    repository: RiddleRepo,
}

impl GetHint {
    pub fn new(repository: RiddleRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<HintParams> for GetHint {
    type Output = String;

    async fn call(&self, params: HintParams) -> Outcome<String> {
        self.repository.get_hint(&params.devinette_id, params.index).await
    }
}

#[derive(Debug, Clone)]
pub struct SubmitAnswerParams {
    pub devinette_id: String,
    pub user_answer: String,
}

pub struct SubmitAnswer {
    repository: RiddleRepo,
}

impl SubmitAnswer {
    pub fn new(repository: RiddleRepo) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl UseCase<SubmitAnswerParams> for SubmitAnswer {
    type Output = DevinetteAnswer;

    async fn call(&self, params: SubmitAnswerParams) -> Outcome<DevinetteAnswer> {
        self.repository
            .check_answer(&params.devinette_id, &params.user_answer)
            .await
    }
}
