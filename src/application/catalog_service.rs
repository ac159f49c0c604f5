use crate::application::dto::{
    AddBomRequest, DiffRequest, MergeOutcome, MergeRequest, RawFormat, SpdxIngestRequest,
};
use crate::application::use_cases::{
    AddBomUseCase, DiffBomsUseCase, EngineContext, FindBomUseCase, IngestSpdxUseCase,
    MergeBomsUseCase,
};
use crate::bom_processing::domain::{Bom, BomMeta, BomRecord, ComponentDiff};
use crate::ports::inbound::BomCatalogPort;
use crate::shared::Result;
use async_trait::async_trait;

/// CatalogService - wires the use cases behind the inbound port
#[derive(Clone)]
pub struct CatalogService {
    add_bom: AddBomUseCase,
    ingest_spdx: IngestSpdxUseCase,
    finder: FindBomUseCase,
    merger: MergeBomsUseCase,
    differ: DiffBomsUseCase,
}

impl CatalogService {
    pub fn new(ctx: EngineContext) -> Self {
        let add_bom = AddBomUseCase::new(ctx.clone());
        let finder = FindBomUseCase::new(ctx.clone());
        let merger = MergeBomsUseCase::new(ctx.clone(), finder.clone(), add_bom.clone());
        let differ = DiffBomsUseCase::new(ctx.clone(), finder.clone(), merger.clone());
        let ingest_spdx = IngestSpdxUseCase::new(ctx, add_bom.clone());
        Self {
            add_bom,
            ingest_spdx,
            finder,
            merger,
            differ,
        }
    }

    pub fn merger(&self) -> &MergeBomsUseCase {
        &self.merger
    }

    pub fn differ(&self) -> &DiffBomsUseCase {
        &self.differ
    }
}

#[async_trait]
impl BomCatalogPort for CatalogService {
    async fn add_bom(&self, request: AddBomRequest) -> Result<BomRecord> {
        self.add_bom.execute(request).await
    }

    async fn ingest_spdx(&self, request: SpdxIngestRequest) -> Result<BomRecord> {
        self.ingest_spdx.execute(request).await
    }

    async fn find_bom_by_id(&self, id: &str, organization: &str) -> Result<Bom> {
        self.finder.find_bom_by_id(id, organization).await
    }

    async fn find_bom_by_serial_and_version(
        &self,
        serial_number: &str,
        bom_version: u32,
        organization: &str,
        raw: bool,
    ) -> Result<Bom> {
        self.finder
            .find_bom_by_serial_and_version(serial_number, bom_version, organization, raw)
            .await
    }

    async fn find_raw_bom(
        &self,
        id: &str,
        organization: &str,
        format: Option<RawFormat>,
    ) -> Result<Vec<u8>> {
        self.finder.find_raw_bom(id, organization, format).await
    }

    async fn find_boms_by_digest(
        &self,
        bom_digest: &str,
        organization: &str,
    ) -> Result<Vec<BomRecord>> {
        self.finder.find_boms_by_digest(bom_digest, organization).await
    }

    async fn find_bom_metas_by_serial_number(
        &self,
        serial_number: &str,
        organization: &str,
    ) -> Result<Vec<BomMeta>> {
        self.finder
            .find_bom_metas_by_serial_number(serial_number, organization)
            .await
    }

    async fn merge_boms(&self, request: &MergeRequest) -> Result<MergeOutcome> {
        self.merger.merge(request).await
    }

    async fn merge_and_store(&self, request: &MergeRequest) -> Result<BomRecord> {
        self.merger.merge_and_store(request).await
    }

    async fn diff(&self, request: &DiffRequest) -> Result<ComponentDiff> {
        self.differ.execute(request).await
    }
}
