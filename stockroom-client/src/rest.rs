//! REST backend for a PostgREST-style API.
//!
//! Business operations go through RPC endpoints (`POST /rest/v1/rpc/<fn>`),
//! plain CRUD through table endpoints filtered by `id=eq.<id>`. Error bodies
//! `{message, code, details, hint}` become [`RemoteError`]s with the HTTP
//! status attached.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use stockroom_core::{
    Category, CategoryId, CategoryUpdate, EntityIdType, InventoryBackend, Invitation,
    InvitationId, InvitationRequest, InvitationStatus, MemberId, MemberRole, MovementType,
    NewCategory, NewOrganization, Organization, OrganizationId, OrganizationMember,
    OrganizationUpdate, Product, ProductId, ProductUpdate, RemoteError, RestockItem,
    RestockOutcome, StockEntryRequest, StockExitRequest, StockMovement, StockroomError,
    StockroomResult, Technician, TechnicianId, TechnicianUpdate, UserId,
};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Single-row responses instead of arrays.
const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Map a non-success response to a [`RemoteError`].
pub fn remote_error_from_body(status: u16, body: &str) -> RemoteError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            code,
            details,
            hint,
        }) => {
            tracing::debug!(status, ?code, ?details, ?hint, "Backend rejected request");
            let error = RemoteError::new(message).with_status(status);
            match code {
                Some(code) => error.with_code(code),
                None => error,
            }
        }
        _ => RemoteError::new(format!("HTTP {}: {}", status, body.trim())).with_status(status),
    }
}

fn transport_error(err: reqwest::Error) -> StockroomError {
    RemoteError::transport(err.to_string()).into()
}

fn header_value(value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|e| ClientError::Header(e.to_string()))
}

fn build_auth_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("apikey"), header_value(&config.anon_key)?);
    let bearer = config.access_token.as_deref().unwrap_or(&config.anon_key);
    headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);
    Ok(headers)
}

fn id_filter(id: impl EntityIdType) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id.as_uuid()))]
}

#[derive(Serialize)]
struct EntryParams<'a> {
    p_organization_id: OrganizationId,
    p_product_id: ProductId,
    p_quantity: i64,
    p_notes: Option<&'a str>,
}

#[derive(Serialize)]
struct ExitParams<'a> {
    p_organization_id: OrganizationId,
    p_product_id: ProductId,
    p_quantity: i64,
    p_movement_type: MovementType,
    p_technician_id: Option<TechnicianId>,
    p_notes: Option<&'a str>,
}

#[derive(Serialize)]
struct BatchParams<'a> {
    p_technician_id: TechnicianId,
    p_items: &'a [RestockItem],
}

#[derive(Deserialize)]
struct MembershipRow {
    organizations: Organization,
}

#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    auth_headers: HeaderMap,
}

impl std::fmt::Debug for RestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let auth_headers = build_auth_headers(config)?;
        Ok(Self {
            client,
            base_url: config.backend_url.trim().trim_end_matches('/').to_string(),
            auth_headers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn rpc<T, B>(&self, function: &str, body: &B) -> StockroomResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(self.rpc_url(function))
            .headers(self.auth_headers.clone())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        self.parse_response(response).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        id: impl EntityIdType,
    ) -> StockroomResult<T> {
        let response = self
            .client
            .get(self.table_url(table))
            .headers(self.auth_headers.clone())
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .query(&[("select", "*")])
            .query(&id_filter(id))
            .send()
            .await
            .map_err(transport_error)?;
        self.parse_response(response).await
    }

    async fn insert<T, B>(&self, table: &str, body: &B) -> StockroomResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(self.table_url(table))
            .headers(self.auth_headers.clone())
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        self.parse_response(response).await
    }

    async fn update<T, B>(&self, table: &str, id: impl EntityIdType, body: &B) -> StockroomResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .patch(self.table_url(table))
            .headers(self.auth_headers.clone())
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .header("Prefer", "return=representation")
            .query(&id_filter(id))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        self.parse_response(response).await
    }

    async fn update_minimal<B>(&self, table: &str, id: impl EntityIdType, body: &B) -> StockroomResult<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .patch(self.table_url(table))
            .headers(self.auth_headers.clone())
            .header("Prefer", "return=minimal")
            .query(&id_filter(id))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response(response).await
    }

    async fn delete(&self, table: &str, id: impl EntityIdType) -> StockroomResult<()> {
        let response = self
            .client
            .delete(self.table_url(table))
            .headers(self.auth_headers.clone())
            .query(&id_filter(id))
            .send()
            .await
            .map_err(transport_error)?;
        self.check_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> StockroomResult<T> {
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(transport_error)
        } else {
            let text = response.text().await.map_err(transport_error)?;
            Err(remote_error_from_body(status.as_u16(), &text).into())
        }
    }

    async fn check_response(&self, response: reqwest::Response) -> StockroomResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.map_err(transport_error)?;
            Err(remote_error_from_body(status.as_u16(), &text).into())
        }
    }
}

#[async_trait]
impl InventoryBackend for RestBackend {
    async fn create_stock_entry(&self, request: &StockEntryRequest) -> StockroomResult<StockMovement> {
        let params = EntryParams {
            p_organization_id: request.organization_id,
            p_product_id: request.product_id,
            p_quantity: request.quantity.get(),
            p_notes: request.notes.as_deref(),
        };
        self.rpc("create_stock_entry", &params).await
    }

    async fn create_stock_exit(&self, request: &StockExitRequest) -> StockroomResult<StockMovement> {
        let params = ExitParams {
            p_organization_id: request.organization_id,
            p_product_id: request.product_id,
            p_quantity: request.quantity.get(),
            p_movement_type: request.movement_type,
            p_technician_id: request.technician_id,
            p_notes: request.notes.as_deref(),
        };
        self.rpc("create_stock_exit", &params).await
    }

    async fn restock_technician(
        &self,
        technician_id: TechnicianId,
        items: &[RestockItem],
    ) -> StockroomResult<RestockOutcome> {
        let params = BatchParams {
            p_technician_id: technician_id,
            p_items: items,
        };
        self.rpc("restock_technician", &params).await
    }

    async fn add_to_technician_inventory(
        &self,
        technician_id: TechnicianId,
        items: &[RestockItem],
    ) -> StockroomResult<RestockOutcome> {
        let params = BatchParams {
            p_technician_id: technician_id,
            p_items: items,
        };
        self.rpc("add_to_technician_inventory", &params).await
    }

    async fn fetch_product(&self, product_id: ProductId) -> StockroomResult<Product> {
        self.select_one("products", product_id).await
    }

    async fn update_product(
        &self,
        product_id: ProductId,
        update: &ProductUpdate,
    ) -> StockroomResult<Product> {
        self.update("products", product_id, update).await
    }

    async fn delete_product(&self, product_id: ProductId) -> StockroomResult<()> {
        self.delete("products", product_id).await
    }

    async fn update_technician(
        &self,
        technician_id: TechnicianId,
        update: &TechnicianUpdate,
    ) -> StockroomResult<Technician> {
        self.update("technicians", technician_id, update).await
    }

    async fn delete_technician(&self, technician_id: TechnicianId) -> StockroomResult<()> {
        self.delete("technicians", technician_id).await
    }

    async fn create_category(&self, category: &NewCategory) -> StockroomResult<Category> {
        self.insert("categories", category).await
    }

    async fn update_category(
        &self,
        category_id: CategoryId,
        update: &CategoryUpdate,
    ) -> StockroomResult<Category> {
        self.update("categories", category_id, update).await
    }

    async fn delete_category(&self, category_id: CategoryId) -> StockroomResult<()> {
        self.delete("categories", category_id).await
    }

    async fn create_organization(
        &self,
        organization: &NewOrganization,
    ) -> StockroomResult<Organization> {
        self.insert("organizations", organization).await
    }

    async fn update_organization(
        &self,
        organization_id: OrganizationId,
        update: &OrganizationUpdate,
    ) -> StockroomResult<Organization> {
        self.update("organizations", organization_id, update).await
    }

    async fn delete_organization(&self, organization_id: OrganizationId) -> StockroomResult<()> {
        self.delete("organizations", organization_id).await
    }

    async fn list_memberships(&self, user_id: UserId) -> StockroomResult<Vec<Organization>> {
        let response = self
            .client
            .get(self.table_url("organization_members"))
            .headers(self.auth_headers.clone())
            .query(&[
                ("select", "organizations(*)".to_string()),
                ("user_id", format!("eq.{}", user_id.as_uuid())),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        let rows: Vec<MembershipRow> = self.parse_response(response).await?;
        Ok(rows.into_iter().map(|row| row.organizations).collect())
    }

    async fn invite_member(&self, request: &InvitationRequest) -> StockroomResult<Invitation> {
        self.insert("invitations", request).await
    }

    async fn update_member_role(
        &self,
        member_id: MemberId,
        role: MemberRole,
    ) -> StockroomResult<OrganizationMember> {
        self.update("organization_members", member_id, &serde_json::json!({ "role": role }))
            .await
    }

    async fn remove_member(&self, member_id: MemberId) -> StockroomResult<()> {
        self.delete("organization_members", member_id).await
    }

    async fn revoke_invitation(&self, invitation_id: InvitationId) -> StockroomResult<()> {
        let body = serde_json::json!({ "status": InvitationStatus::Revoked });
        self.update_minimal("invitations", invitation_id, &body).await
    }
}
