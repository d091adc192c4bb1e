pub mod logic;
pub mod model;
pub mod store;

// Export the folding engine and the operations built on it
pub use logic::{
    cure_details, donors_with_vital_disease, tissues_by_density, top_researcher_suggestions,
    ChildGroupSpec, CureDetailsReport, FoldError, FoldKeySpec, ResearcherSuggestionsReport,
    ResultFolder, TissueDensityReport, VitalDiseaseReport,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::traits::{DonorStore, DrugStore, OperationRowSource, TissueStore};
pub use store::{MemoryStore, Store};
