use crate::model::{
    Cure, Disease, Donor, DonorCondition, Drug, FlatRow, FutureWork, Id, JournalQuality, NewDonor,
    NewDrug, NewTissue, Publication, ReferenceView, Researcher, Tissue,
};
use crate::store::traits::{DonorStore, DrugStore, OperationRowSource, Store, TissueStore};
use anyhow::Result;
use itertools::Itertools;
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    next_id: Id,
    donors: HashMap<Id, Donor>,
    tissues: HashMap<Id, Tissue>,
    drugs: HashMap<Id, Drug>,
    cures: HashMap<Id, Cure>,
    diseases: HashMap<Id, Disease>,
    conditions: HashMap<Id, DonorCondition>,
    researchers: HashMap<Id, Researcher>,
    publications: HashMap<String, Publication>,
    future_works: HashMap<Id, FutureWork>,
}

impl Tables {
    // Sequence-style allocator shared by every table.
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store implementing every collaborator contract.
///
/// Doubles as the reference implementation of the dereferencing collaborator:
/// its row-source methods perform the joins and unnests in memory and flatten
/// referenced entities into rows through [`ReferenceView`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_cure(&self, cure: Cure) {
        self.tables.write().await.cures.insert(cure.cure_id, cure);
    }

    pub async fn insert_disease(&self, disease: Disease) {
        self.tables
            .write()
            .await
            .diseases
            .insert(disease.disease_id, disease);
    }

    pub async fn insert_condition(&self, condition: DonorCondition) {
        self.tables
            .write()
            .await
            .conditions
            .insert(condition.condition_id, condition);
    }

    pub async fn insert_researcher(&self, researcher: Researcher) {
        self.tables
            .write()
            .await
            .researchers
            .insert(researcher.researcher_id, researcher);
    }

    pub async fn insert_publication(&self, publication: Publication) {
        self.tables
            .write()
            .await
            .publications
            .insert(publication.publication_doi.clone(), publication);
    }

    pub async fn insert_future_work(&self, future_work: FutureWork) {
        self.tables
            .write()
            .await
            .future_works
            .insert(future_work.future_work_id, future_work);
    }
}

#[async_trait::async_trait]
impl DonorStore for MemoryStore {
    async fn get_donor(&self, id: Id) -> Result<Option<Donor>> {
        Ok(self.tables.read().await.donors.get(&id).cloned())
    }

    async fn list_donors(&self) -> Result<Vec<Donor>> {
        let tables = self.tables.read().await;
        let mut donors: Vec<_> = tables.donors.values().cloned().collect();
        donors.sort_by_key(|donor| donor.donor_id);
        Ok(donors)
    }

    async fn create_donor(&self, donor: NewDonor) -> Result<Donor> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let donor = donor.into_donor(id);
        tables.donors.insert(id, donor.clone());
        Ok(donor)
    }

    async fn update_donor(&self, donor: Donor) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.donors.get_mut(&donor.donor_id) {
            Some(existing) => {
                *existing = donor;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_donor(&self, id: Id) -> Result<bool> {
        Ok(self.tables.write().await.donors.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl TissueStore for MemoryStore {
    async fn get_tissue(&self, id: Id) -> Result<Option<Tissue>> {
        Ok(self.tables.read().await.tissues.get(&id).cloned())
    }

    async fn list_tissues(&self) -> Result<Vec<Tissue>> {
        let tables = self.tables.read().await;
        let mut tissues: Vec<_> = tables.tissues.values().cloned().collect();
        tissues.sort_by_key(|tissue| tissue.tissue_id);
        Ok(tissues)
    }

    async fn create_tissue(&self, tissue: NewTissue) -> Result<Tissue> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let tissue = tissue.into_tissue(id);
        tables.tissues.insert(id, tissue.clone());
        Ok(tissue)
    }

    async fn update_tissue(&self, tissue: Tissue) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.tissues.get_mut(&tissue.tissue_id) {
            Some(existing) => {
                *existing = tissue;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_tissue(&self, id: Id) -> Result<bool> {
        Ok(self.tables.write().await.tissues.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl DrugStore for MemoryStore {
    async fn get_drug(&self, id: Id) -> Result<Option<Drug>> {
        Ok(self.tables.read().await.drugs.get(&id).cloned())
    }

    async fn list_drugs(&self) -> Result<Vec<Drug>> {
        let tables = self.tables.read().await;
        let mut drugs: Vec<_> = tables.drugs.values().cloned().collect();
        drugs.sort_by_key(|drug| drug.drug_id);
        Ok(drugs)
    }

    async fn create_drug(&self, drug: NewDrug) -> Result<Drug> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        // Allergy marshalling happens here; an invalid list fails the write
        // before the table is touched.
        let drug = drug.into_drug(id)?;
        tables.drugs.insert(id, drug.clone());
        Ok(drug)
    }

    async fn update_drug(&self, drug: Drug) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.drugs.get_mut(&drug.drug_id) {
            Some(existing) => {
                *existing = drug;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_drug(&self, id: Id) -> Result<bool> {
        Ok(self.tables.write().await.drugs.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl OperationRowSource for MemoryStore {
    async fn cure_composition_rows(&self, cure_id: Id) -> Result<Vec<FlatRow>> {
        let tables = self.tables.read().await;
        let Some(cure) = tables.cures.get(&cure_id) else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for drug_id in &cure.cure_composition {
            // Dangling composition entries contribute nothing; a partially
            // resolved row is never emitted.
            let Some(drug) = tables.drugs.get(drug_id) else {
                continue;
            };
            let row = ReferenceView::of(drug)?
                .splice_into(FlatRow::new().set("cure_id", cure.cure_id));
            rows.push(row);
        }

        debug!("cure {cure_id}: produced {} composition rows", rows.len());
        Ok(rows)
    }

    async fn vital_disease_rows(&self, disease_id: Id) -> Result<Vec<FlatRow>> {
        let tables = self.tables.read().await;

        // Stable iteration keeps the emitted stream deterministic; the folder
        // itself does not depend on it.
        let mut rows = Vec::new();
        for future_work in tables
            .future_works
            .values()
            .sorted_by_key(|work| work.future_work_id)
        {
            for condition_id in &future_work.future_work_suggested_by {
                let Some(condition) = tables.conditions.get(condition_id) else {
                    continue;
                };
                if condition.condition_disease != disease_id {
                    continue;
                }
                let Some(tissue) = tables.tissues.get(&condition.condition_tissue) else {
                    continue;
                };
                if !tissue.tissue_is_vital {
                    continue;
                }
                let (Some(donor), Some(disease)) = (
                    tables.donors.get(&condition.condition_donor),
                    tables.diseases.get(&condition.condition_disease),
                ) else {
                    continue;
                };

                let row = FlatRow::new().set("disease_name", disease.disease_name.clone());
                let row = ReferenceView::of(donor)?.splice_into(row);
                let row = ReferenceView::of(tissue)?.splice_into(row);
                rows.push(row);
            }
        }

        debug!(
            "disease {disease_id}: produced {} vital-condition rows",
            rows.len()
        );
        Ok(rows)
    }

    async fn researcher_suggestion_rows(&self, quality: JournalQuality) -> Result<Vec<FlatRow>> {
        let tables = self.tables.read().await;

        let mut rows = Vec::new();
        for publication in tables
            .publications
            .values()
            .sorted_by(|a, b| a.publication_doi.cmp(&b.publication_doi))
        {
            if publication.publication_journal_quality != quality {
                continue;
            }
            for author_id in &publication.publication_authors {
                let Some(researcher) = tables.researchers.get(author_id) else {
                    continue;
                };
                for work_id in &researcher.researcher_recommended_works {
                    let Some(future_work) = tables.future_works.get(work_id) else {
                        continue;
                    };

                    let row = ReferenceView::of(researcher)?
                        .splice_into(FlatRow::new());
                    let row = ReferenceView::of(publication)?.splice_into(row);
                    let row = ReferenceView::of(future_work)?.splice_into(row);
                    rows.push(row);
                }
            }
        }

        debug!(
            "journal quality {quality:?}: produced {} suggestion rows",
            rows.len()
        );
        Ok(rows)
    }
}

impl Store for MemoryStore {}
