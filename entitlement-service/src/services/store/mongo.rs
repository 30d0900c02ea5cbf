use crate::models::{Company, CompanyPatch, Member, MemberRole, Membership, ResourceKind};
use crate::services::store::{EntitlementStore, TenantDirectory};
use anyhow::Result;
use async_trait::async_trait;
use mongodb::options::IndexOptions;
use mongodb::{bson::doc, Collection, Database, IndexModel};

/// MongoDB-backed entitlement store and tenant directory.
#[derive(Clone)]
pub struct MongoEntitlementStore {
    db: Database,
    companies: Collection<Company>,
    users: Collection<Member>,
}

impl MongoEntitlementStore {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            companies: db.collection("companies"),
            users: db.collection("users"),
        }
    }

    /// Initialize indexes for tenant-scoped queries.
    pub async fn init_indexes(&self) -> Result<()> {
        // company_id index on each counted collection for scoped counts
        for kind in [ResourceKind::Users, ResourceKind::Vehicles, ResourceKind::Assets] {
            let index = IndexModel::builder()
                .keys(doc! { "company_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name(format!("{}_company_idx", kind.collection()))
                        .build(),
                )
                .build();

            self.db
                .collection::<mongodb::bson::Document>(kind.collection())
                .create_indexes([index], None)
                .await?;
        }

        // Lookup by provider subscription id when reconciling events
        let subscription_index = IndexModel::builder()
            .keys(doc! { "stripe_subscription_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("company_stripe_subscription_idx".to_string())
                    .build(),
            )
            .build();

        self.companies
            .create_indexes([subscription_index], None)
            .await?;

        tracing::info!("Entitlement store indexes initialized");
        Ok(())
    }
}

#[async_trait]
impl EntitlementStore for MongoEntitlementStore {
    async fn company(&self, id: &str) -> Result<Option<Company>> {
        let filter = doc! { "_id": id };
        let company = self.companies.find_one(filter, None).await?;
        Ok(company)
    }

    async fn merge_company(&self, id: &str, patch: CompanyPatch) -> Result<()> {
        let filter = doc! { "_id": id };
        let update = patch.to_set_document();
        self.companies.update_one(filter, update, None).await?;
        Ok(())
    }

    async fn resource_count(&self, company_id: &str, kind: ResourceKind) -> Result<u64> {
        let filter = doc! { "company_id": company_id };
        let count = self
            .db
            .collection::<mongodb::bson::Document>(kind.collection())
            .count_documents(filter, None)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl TenantDirectory for MongoEntitlementStore {
    async fn membership(&self, user_id: &str) -> Result<Option<Membership>> {
        let filter = doc! { "_id": user_id };
        let member = self.users.find_one(filter, None).await?;

        Ok(member.and_then(|m| {
            m.company_id.map(|company_id| Membership {
                company_id,
                role: m.role.unwrap_or(MemberRole::Member),
            })
        }))
    }
}
