use crate::model::{AllergyList, CollectionError, Id};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonorSex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "X")]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub donor_id: Id,
    pub donor_name: String,
    pub donor_surname: String,
    pub donor_date_of_birth: NaiveDate,
    pub donor_sex: DonorSex,
}

/// Creation payload for a donor; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonor {
    pub donor_name: String,
    pub donor_surname: String,
    pub donor_date_of_birth: NaiveDate,
    pub donor_sex: DonorSex,
}

impl NewDonor {
    pub fn into_donor(self, donor_id: Id) -> Donor {
        Donor {
            donor_id,
            donor_name: self.donor_name,
            donor_surname: self.donor_surname,
            donor_date_of_birth: self.donor_date_of_birth,
            donor_sex: self.donor_sex,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tissue {
    pub tissue_id: Id,
    pub tissue_name: String,
    pub tissue_description: String,
    /// Density in g/cm3.
    pub tissue_density: f64,
    pub tissue_is_vital: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTissue {
    pub tissue_name: String,
    pub tissue_description: String,
    pub tissue_density: f64,
    pub tissue_is_vital: bool,
}

impl NewTissue {
    pub fn into_tissue(self, tissue_id: Id) -> Tissue {
        Tissue {
            tissue_id,
            tissue_name: self.tissue_name,
            tissue_description: self.tissue_description,
            tissue_density: self.tissue_density,
            tissue_is_vital: self.tissue_is_vital,
        }
    }
}

/// A drug with its bounded allergy list. The list is marshalled through
/// [`AllergyList`] on every write so an oversized external list never reaches
/// the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drug {
    pub drug_id: Id,
    pub drug_name: String,
    pub drug_description: String,
    pub drug_allergies: AllergyList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDrug {
    pub drug_name: String,
    pub drug_description: String,
    #[serde(default)]
    pub drug_allergies: Vec<String>,
}

impl NewDrug {
    /// Validate the external allergy list and build the storable drug.
    pub fn into_drug(self, drug_id: Id) -> Result<Drug, CollectionError> {
        Ok(Drug {
            drug_id,
            drug_name: self.drug_name,
            drug_description: self.drug_description,
            drug_allergies: AllergyList::new(self.drug_allergies)?,
        })
    }
}

/// A cure composed of drug references (many-to-many through an unnested
/// collection column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cure {
    pub cure_id: Id,
    pub cure_name: String,
    pub cure_composition: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub disease_id: Id,
    pub disease_name: String,
}

/// A diagnosed condition: the join object linking a donor, an affected
/// tissue, and a disease through object references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorCondition {
    pub condition_id: Id,
    pub condition_donor: Id,
    pub condition_tissue: Id,
    pub condition_disease: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalQuality {
    Top,
    Middle,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Researcher {
    pub researcher_id: Id,
    pub researcher_name: String,
    pub researcher_surname: String,
    pub researcher_email: String,
    pub researcher_institution: String,
    /// Future works recommended to this researcher.
    pub researcher_recommended_works: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub publication_doi: String,
    pub publication_title: String,
    pub publication_journal: String,
    pub publication_journal_quality: JournalQuality,
    pub publication_authors: Vec<Id>,
}

/// A suggested future work, traced back to the donor conditions that
/// motivated the suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureWork {
    pub future_work_id: Id,
    pub future_work_description: String,
    pub future_work_suggested_by: Vec<Id>,
}
