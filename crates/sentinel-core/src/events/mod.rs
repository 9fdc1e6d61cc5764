//! Domain events published on the in-process event bus

mod domain_event;

pub use domain_event::{
    AttributionUnknownEvent, DomainEvent, InviteAttributedEvent, MemberVerifiedEvent,
    NicknameUpdatedEvent,
};
