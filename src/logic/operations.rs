use crate::logic::fold::{FoldKeySpec, ResultFolder};
use crate::model::{FieldValue, Id, JournalQuality, Tissue};
use crate::store::traits::{OperationRowSource, TissueStore};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

/// Organs and tissues below a density threshold, lightest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TissueDensityReport {
    pub threshold: f64,
    pub count: usize,
    pub tissues: Vec<Tissue>,
}

pub async fn tissues_by_density<S>(store: &S, max_density: f64) -> Result<TissueDensityReport>
where
    S: TissueStore + ?Sized,
{
    let tissues: Vec<Tissue> = store
        .list_tissues()
        .await?
        .into_iter()
        .filter(|tissue| tissue.tissue_density < max_density)
        .sorted_by(|a, b| {
            a.tissue_density
                .partial_cmp(&b.tissue_density)
                .unwrap_or(Ordering::Equal)
        })
        .collect();

    debug!(
        "density threshold {max_density}: {} matching tissues",
        tissues.len()
    );
    Ok(TissueDensityReport {
        threshold: max_density,
        count: tissues.len(),
        tissues,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CureDrug {
    pub drug_id: Id,
    pub drug_name: String,
    pub drug_description: String,
    pub drug_allergies: Vec<String>,
}

/// A cure, its deduplicated drug list, and every allergy linked to any of
/// those drugs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CureDetailsReport {
    pub cure_id: Id,
    pub drugs: Vec<CureDrug>,
    pub all_allergies: Vec<String>,
}

/// Returns `None` when the cure does not exist (no composition rows).
pub async fn cure_details<S>(store: &S, cure_id: Id) -> Result<Option<CureDetailsReport>>
where
    S: OperationRowSource + ?Sized,
{
    let rows = store.cure_composition_rows(cure_id).await?;

    let spec = FoldKeySpec::new(&["cure_id"], &["cure_id"])
        .child_group(
            "drugs",
            &["drug_id"],
            &["drug_id", "drug_name", "drug_description", "drug_allergies"],
        )
        .distinct_collect("drug_allergies");

    let Some(entity) = ResultFolder::fold(rows, &spec)?.into_iter().next() else {
        return Ok(None);
    };

    let drugs = entity
        .group("drugs")
        .iter()
        .map(|child| {
            Ok(CureDrug {
                drug_id: as_int(child.field("drug_id"), "drug_id")?,
                drug_name: as_text(child.field("drug_name"), "drug_name")?,
                drug_description: as_text(child.field("drug_description"), "drug_description")?,
                drug_allergies: as_text_list(child.field("drug_allergies"), "drug_allergies")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let all_allergies = text_items(entity.distinct_values.as_deref().unwrap_or(&[]))?;

    debug!(
        "cure {cure_id}: {} drugs, {} distinct allergies",
        drugs.len(),
        all_allergies.len()
    );
    Ok(Some(CureDetailsReport {
        cure_id,
        drugs,
        all_allergies,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedTissue {
    pub tissue_id: Id,
    pub tissue_name: String,
    pub tissue_is_vital: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalDiseaseDonor {
    pub donor_id: Id,
    pub donor_name: String,
    pub donor_surname: String,
    pub donor_date_of_birth: NaiveDate,
    pub donor_sex: String,
    pub affected_vital_tissues: Vec<AffectedTissue>,
}

/// Donors whose given disease affects vital tissues, reached through
/// future-work suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalDiseaseReport {
    pub disease_id: Id,
    pub disease_name: Option<String>,
    pub donors: Vec<VitalDiseaseDonor>,
}

pub async fn donors_with_vital_disease<S>(store: &S, disease_id: Id) -> Result<VitalDiseaseReport>
where
    S: OperationRowSource + ?Sized,
{
    let rows = store.vital_disease_rows(disease_id).await?;

    let spec = FoldKeySpec::new(
        &["donor_id"],
        &[
            "donor_id",
            "donor_name",
            "donor_surname",
            "donor_date_of_birth",
            "donor_sex",
            "disease_name",
        ],
    )
    .child_group(
        "affected_vital_tissues",
        &["tissue_id"],
        &["tissue_id", "tissue_name", "tissue_is_vital"],
    );

    let folded = ResultFolder::fold(rows, &spec)?;

    // The disease name repeats on every row; lift it off the first donor.
    let disease_name = folded
        .first()
        .map(|entity| as_text(entity.field("disease_name"), "disease_name"))
        .transpose()?;

    let donors = folded
        .iter()
        .map(|entity| {
            let affected_vital_tissues = entity
                .group("affected_vital_tissues")
                .iter()
                .map(|child| {
                    Ok(AffectedTissue {
                        tissue_id: as_int(child.field("tissue_id"), "tissue_id")?,
                        tissue_name: as_text(child.field("tissue_name"), "tissue_name")?,
                        tissue_is_vital: as_bool(child.field("tissue_is_vital"), "tissue_is_vital")?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(VitalDiseaseDonor {
                donor_id: as_int(entity.field("donor_id"), "donor_id")?,
                donor_name: as_text(entity.field("donor_name"), "donor_name")?,
                donor_surname: as_text(entity.field("donor_surname"), "donor_surname")?,
                donor_date_of_birth: as_date(
                    entity.field("donor_date_of_birth"),
                    "donor_date_of_birth",
                )?,
                donor_sex: as_text(entity.field("donor_sex"), "donor_sex")?,
                affected_vital_tissues,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("disease {disease_id}: {} donors folded", donors.len());
    Ok(VitalDiseaseReport {
        disease_id,
        disease_name,
        donors,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationSummary {
    pub publication_doi: String,
    pub publication_title: String,
    pub publication_journal: String,
    pub publication_journal_quality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FutureWorkSummary {
    pub future_work_id: Id,
    pub future_work_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearcherSuggestions {
    pub researcher_id: Id,
    pub researcher_name: String,
    pub researcher_surname: String,
    pub researcher_email: String,
    pub researcher_institution: String,
    pub top_publications: Vec<PublicationSummary>,
    pub suggested_future_works: Vec<FutureWorkSummary>,
}

/// Suggestions provided to researchers who published at the given journal
/// quality. Publications and future works repeat independently in the row
/// stream and are folded into two separately deduplicated groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearcherSuggestionsReport {
    pub journal_quality: JournalQuality,
    pub researchers: Vec<ResearcherSuggestions>,
}

pub async fn top_researcher_suggestions<S>(
    store: &S,
    quality: JournalQuality,
) -> Result<ResearcherSuggestionsReport>
where
    S: OperationRowSource + ?Sized,
{
    let rows = store.researcher_suggestion_rows(quality).await?;

    let spec = FoldKeySpec::new(
        &["researcher_id"],
        &[
            "researcher_id",
            "researcher_name",
            "researcher_surname",
            "researcher_email",
            "researcher_institution",
        ],
    )
    .child_group(
        "top_publications",
        &["publication_doi"],
        &[
            "publication_doi",
            "publication_title",
            "publication_journal",
            "publication_journal_quality",
        ],
    )
    .child_group(
        "suggested_future_works",
        &["future_work_id"],
        &["future_work_id", "future_work_description"],
    );

    let researchers = ResultFolder::fold(rows, &spec)?
        .iter()
        .map(|entity| {
            let top_publications = entity
                .group("top_publications")
                .iter()
                .map(|child| {
                    Ok(PublicationSummary {
                        publication_doi: as_text(child.field("publication_doi"), "publication_doi")?,
                        publication_title: as_text(
                            child.field("publication_title"),
                            "publication_title",
                        )?,
                        publication_journal: as_text(
                            child.field("publication_journal"),
                            "publication_journal",
                        )?,
                        publication_journal_quality: as_text(
                            child.field("publication_journal_quality"),
                            "publication_journal_quality",
                        )?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let suggested_future_works = entity
                .group("suggested_future_works")
                .iter()
                .map(|child| {
                    Ok(FutureWorkSummary {
                        future_work_id: as_int(child.field("future_work_id"), "future_work_id")?,
                        future_work_description: as_text(
                            child.field("future_work_description"),
                            "future_work_description",
                        )?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(ResearcherSuggestions {
                researcher_id: as_int(entity.field("researcher_id"), "researcher_id")?,
                researcher_name: as_text(entity.field("researcher_name"), "researcher_name")?,
                researcher_surname: as_text(entity.field("researcher_surname"), "researcher_surname")?,
                researcher_email: as_text(entity.field("researcher_email"), "researcher_email")?,
                researcher_institution: as_text(
                    entity.field("researcher_institution"),
                    "researcher_institution",
                )?,
                top_publications,
                suggested_future_works,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "journal quality {quality:?}: {} researchers folded",
        researchers.len()
    );
    Ok(ResearcherSuggestionsReport {
        journal_quality: quality,
        researchers,
    })
}

// Typed extraction from folded fields. A wrong shape here means the row
// source and the fold spec disagree, so these fail loudly instead of
// coercing.

fn as_int(value: Option<&FieldValue>, field: &str) -> Result<Id> {
    match value {
        Some(FieldValue::Int(v)) => Ok(*v),
        other => Err(anyhow!("expected integer in field '{field}', got {other:?}")),
    }
}

fn as_bool(value: Option<&FieldValue>, field: &str) -> Result<bool> {
    match value {
        Some(FieldValue::Bool(v)) => Ok(*v),
        other => Err(anyhow!("expected boolean in field '{field}', got {other:?}")),
    }
}

fn as_text(value: Option<&FieldValue>, field: &str) -> Result<String> {
    match value {
        Some(FieldValue::Text(v)) => Ok(v.clone()),
        other => Err(anyhow!("expected text in field '{field}', got {other:?}")),
    }
}

fn as_date(value: Option<&FieldValue>, field: &str) -> Result<NaiveDate> {
    match value {
        Some(FieldValue::Date(v)) => Ok(*v),
        // Dereferenced views carry dates in ISO text form.
        Some(FieldValue::Text(v)) => v
            .parse()
            .map_err(|e| anyhow!("field '{field}' is not an ISO date: {e}")),
        other => Err(anyhow!("expected date in field '{field}', got {other:?}")),
    }
}

fn as_text_list(value: Option<&FieldValue>, field: &str) -> Result<Vec<String>> {
    match value {
        Some(FieldValue::List(items)) => text_items(items),
        Some(FieldValue::Null) => Ok(Vec::new()),
        other => Err(anyhow!("expected list in field '{field}', got {other:?}")),
    }
}

fn text_items(items: &[FieldValue]) -> Result<Vec<String>> {
    items
        .iter()
        .map(|item| match item {
            FieldValue::Text(v) => Ok(v.clone()),
            other => Err(anyhow!("expected text list item, got {other:?}")),
        })
        .collect()
}
