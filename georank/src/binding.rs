//! Per-domain table and column bindings.
//!
//! The engine is generic; everything that differs between jobs, local jobs and
//! used-product listings lives here. All identifiers are compile-time constants,
//! so nothing user-supplied is ever interpolated into SQL.

use crate::interface::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Integer,
    Real,
    Text,
}

impl AttributeKind {
    pub(crate) fn sql_type(&self) -> &'static str {
        match self {
            AttributeKind::Integer => "INTEGER",
            AttributeKind::Real => "REAL",
            AttributeKind::Text => "TEXT",
        }
    }
}

/// A domain attribute column: carried through to results and filterable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeColumn {
    pub name: &'static str,
    pub kind: AttributeKind,
}

/// Child table holding one row per listing for a per-user marker (bookmark, application).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerBinding {
    pub table: &'static str,
    pub listing_fk: &'static str,
}

/// Repeating sub-entity table (one row per image).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBinding {
    pub table: &'static str,
    pub listing_fk: &'static str,
    pub url_column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainBinding {
    pub domain: Domain,
    pub listing_table: &'static str,
    pub title_column: &'static str,
    pub description_column: &'static str,
    /// FTS5 index over (title, description), keyed by listing rowid.
    pub fts_table: &'static str,
    /// Embedded JSON array column, parsed defensively.
    pub tags_column: Option<&'static str>,
    pub location_table: &'static str,
    pub location_fk: &'static str,
    pub attributes: &'static [AttributeColumn],
    pub bookmarks: MarkerBinding,
    pub applications: Option<MarkerBinding>,
    pub images: Option<ImageBinding>,
    /// Default radius cap in km for this domain.
    pub radius_cap_km: f64,
    pub default_page_size: u32,
}

impl DomainBinding {
    pub fn for_domain(domain: Domain) -> &'static DomainBinding {
        match domain {
            Domain::Jobs => &JOBS,
            Domain::LocalJobs => &LOCAL_JOBS,
            Domain::UsedProducts => &USED_PRODUCTS,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&'static AttributeColumn> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

pub static JOBS: DomainBinding = DomainBinding {
    domain: Domain::Jobs,
    listing_table: "jobs",
    title_column: "title",
    description_column: "description",
    fts_table: "jobs_fts",
    tags_column: Some("skills"),
    location_table: "job_locations",
    location_fk: "job_id",
    attributes: &[
        AttributeColumn { name: "company_name", kind: AttributeKind::Text },
        AttributeColumn { name: "work_mode", kind: AttributeKind::Text },
        AttributeColumn { name: "salary_min", kind: AttributeKind::Integer },
        AttributeColumn { name: "salary_max", kind: AttributeKind::Integer },
        AttributeColumn { name: "salary_unit", kind: AttributeKind::Text },
        AttributeColumn { name: "experience_years", kind: AttributeKind::Integer },
    ],
    bookmarks: MarkerBinding { table: "job_bookmarks", listing_fk: "job_id" },
    applications: Some(MarkerBinding { table: "job_applications", listing_fk: "job_id" }),
    images: None,
    radius_cap_km: 500.0,
    default_page_size: 20,
};

pub static LOCAL_JOBS: DomainBinding = DomainBinding {
    domain: Domain::LocalJobs,
    listing_table: "local_jobs",
    title_column: "title",
    description_column: "description",
    fts_table: "local_jobs_fts",
    tags_column: None,
    location_table: "local_job_locations",
    location_fk: "local_job_id",
    attributes: &[
        AttributeColumn { name: "company", kind: AttributeKind::Text },
        AttributeColumn { name: "salary_min", kind: AttributeKind::Integer },
        AttributeColumn { name: "salary_max", kind: AttributeKind::Integer },
        AttributeColumn { name: "salary_unit", kind: AttributeKind::Text },
        AttributeColumn { name: "min_age", kind: AttributeKind::Integer },
        AttributeColumn { name: "max_age", kind: AttributeKind::Integer },
    ],
    bookmarks: MarkerBinding { table: "local_job_bookmarks", listing_fk: "local_job_id" },
    applications: Some(MarkerBinding { table: "local_job_applications", listing_fk: "local_job_id" }),
    images: Some(ImageBinding {
        table: "local_job_images",
        listing_fk: "local_job_id",
        url_column: "image_url",
    }),
    radius_cap_km: 200.0,
    default_page_size: 30,
};

pub static USED_PRODUCTS: DomainBinding = DomainBinding {
    domain: Domain::UsedProducts,
    listing_table: "used_product_listings",
    title_column: "name",
    description_column: "description",
    fts_table: "used_product_listings_fts",
    tags_column: None,
    location_table: "used_product_listing_locations",
    location_fk: "product_id",
    attributes: &[
        AttributeColumn { name: "price", kind: AttributeKind::Real },
        AttributeColumn { name: "price_unit", kind: AttributeKind::Text },
        AttributeColumn { name: "condition", kind: AttributeKind::Text },
    ],
    bookmarks: MarkerBinding { table: "used_product_listing_bookmarks", listing_fk: "product_id" },
    applications: None,
    images: Some(ImageBinding {
        table: "used_product_listing_images",
        listing_fk: "product_id",
        url_column: "image_url",
    }),
    radius_cap_km: 200.0,
    default_page_size: 30,
};
