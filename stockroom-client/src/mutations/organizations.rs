//! Organizations, members and invitations.

use stockroom_core::{
    EntityIdType, InventoryBackend, Invitation, InvitationId, InvitationRequest, MemberId,
    MemberRole, NewOrganization, Organization, OrganizationId, OrganizationMember,
    OrganizationUpdate, StockroomResult,
};
use stockroom_storage::{
    remove_from_list, shallow_merge, EntityKeys, InvalidationPlan, OrganizationKeys,
};

use super::{edited_fields, required, required_edit, Mutations};

impl<B: InventoryBackend> Mutations<B> {
    pub async fn create_organization(
        &self,
        organization: NewOrganization,
    ) -> StockroomResult<Organization> {
        let organization = NewOrganization {
            name: required("name", &organization.name)?,
            ..organization
        };
        self.settle(
            "create_organization",
            Vec::new(),
            InvalidationPlan::organization_change(),
            self.backend.create_organization(&organization),
        )
        .await
    }

    pub async fn update_organization(
        &self,
        organization_id: OrganizationId,
        update: OrganizationUpdate,
    ) -> StockroomResult<Organization> {
        let update = OrganizationUpdate {
            name: required_edit("name", update.name)?,
            ..update
        };
        let key = OrganizationKeys::detail(organization_id);
        let fields = edited_fields(&key, &update)?;
        let patch = self
            .cache
            .begin_patch(&key, |value| shallow_merge(value, &fields))?;

        self.settle(
            "update_organization",
            patch.into_iter().collect(),
            InvalidationPlan::organization_change(),
            self.backend.update_organization(organization_id, &update),
        )
        .await
    }

    /// Delete an organization; it disappears from every cached
    /// organization list.
    pub async fn delete_organization(&self, organization_id: OrganizationId) -> StockroomResult<()> {
        let id = organization_id.as_uuid().to_string();
        let patches = self.cache.begin_patches_under(&OrganizationKeys::lists(), |value| {
            remove_from_list(value, &id)
        })?;

        self.settle(
            "delete_organization",
            patches,
            InvalidationPlan::organization_change(),
            self.backend.delete_organization(organization_id),
        )
        .await
    }

    /// Invite someone by email. A pending invitation or membership for the
    /// same email fails remotely with a duplicate-email error.
    pub async fn invite_member(&self, request: InvitationRequest) -> StockroomResult<Invitation> {
        let request = InvitationRequest {
            email: required("email", &request.email)?,
            ..request
        };
        self.settle(
            "invite_member",
            Vec::new(),
            InvalidationPlan::invitation_change(request.organization_id),
            self.backend.invite_member(&request),
        )
        .await
    }

    pub async fn update_member_role(
        &self,
        organization_id: OrganizationId,
        member_id: MemberId,
        role: MemberRole,
    ) -> StockroomResult<OrganizationMember> {
        self.settle(
            "update_member_role",
            Vec::new(),
            InvalidationPlan::member_change(organization_id),
            self.backend.update_member_role(member_id, role),
        )
        .await
    }

    /// Remove a member; it disappears from the cached member list of the
    /// organization.
    pub async fn remove_member(
        &self,
        organization_id: OrganizationId,
        member_id: MemberId,
    ) -> StockroomResult<()> {
        let id = member_id.as_uuid().to_string();
        let patches = self
            .cache
            .begin_patches_under(&OrganizationKeys::members(organization_id), |value| {
                remove_from_list(value, &id)
            })?;

        self.settle(
            "remove_member",
            patches,
            InvalidationPlan::member_change(organization_id),
            self.backend.remove_member(member_id),
        )
        .await
    }

    pub async fn revoke_invitation(
        &self,
        organization_id: OrganizationId,
        invitation_id: InvitationId,
    ) -> StockroomResult<()> {
        self.settle(
            "revoke_invitation",
            Vec::new(),
            InvalidationPlan::invitation_change(organization_id),
            self.backend.revoke_invitation(invitation_id),
        )
        .await
    }
}
