use crate::model::{Donor, Drug, FlatRow, Id, JournalQuality, NewDonor, NewDrug, NewTissue, Tissue};
use anyhow::Result;

/// Single-entity donor contract: identifier in, current snapshot (or absence)
/// out.
#[async_trait::async_trait]
pub trait DonorStore: Send + Sync {
    async fn get_donor(&self, id: Id) -> Result<Option<Donor>>;
    async fn list_donors(&self) -> Result<Vec<Donor>>;
    async fn create_donor(&self, donor: NewDonor) -> Result<Donor>;
    async fn update_donor(&self, donor: Donor) -> Result<bool>;
    async fn delete_donor(&self, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait TissueStore: Send + Sync {
    async fn get_tissue(&self, id: Id) -> Result<Option<Tissue>>;
    async fn list_tissues(&self) -> Result<Vec<Tissue>>;
    async fn create_tissue(&self, tissue: NewTissue) -> Result<Tissue>;
    async fn update_tissue(&self, tissue: Tissue) -> Result<bool>;
    async fn delete_tissue(&self, id: Id) -> Result<bool>;
}

/// Drug contract; allergy lists cross this boundary already marshalled into
/// [`crate::model::AllergyList`], so an oversized external list is rejected
/// before any write is attempted.
#[async_trait::async_trait]
pub trait DrugStore: Send + Sync {
    async fn get_drug(&self, id: Id) -> Result<Option<Drug>>;
    async fn list_drugs(&self) -> Result<Vec<Drug>>;
    async fn create_drug(&self, drug: NewDrug) -> Result<Drug>;
    async fn update_drug(&self, drug: Drug) -> Result<bool>;
    async fn delete_drug(&self, id: Id) -> Result<bool>;
}

/// The row-stream collaborator behind the aggregation operations.
///
/// Every method returns an ordered, already-materialized row stream with
/// reference-typed columns dereferenced and collection columns unnested into
/// list values. A dangling reference never produces a partially resolved
/// row: the implementation either drops the row or nulls the whole branch.
#[async_trait::async_trait]
pub trait OperationRowSource: Send + Sync {
    /// Rows of (cure, unnested composition drug) for one cure.
    async fn cure_composition_rows(&self, cure_id: Id) -> Result<Vec<FlatRow>>;
    /// Rows of (donor, affected vital tissue, disease) reached through
    /// future-work suggestions, filtered to one disease.
    async fn vital_disease_rows(&self, disease_id: Id) -> Result<Vec<FlatRow>>;
    /// Rows of (researcher, authored publication, recommended future work)
    /// filtered to one journal quality.
    async fn researcher_suggestion_rows(&self, quality: JournalQuality) -> Result<Vec<FlatRow>>;
}

pub trait Store: DonorStore + TissueStore + DrugStore + OperationRowSource + Send + Sync {}
