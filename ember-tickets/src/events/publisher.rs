use ember_shared::clients::rabbitmq::RabbitMQClient;
use ember_shared::types::event::{payloads, routing_keys, Event};

use crate::models::{Ticket, TicketMessage};
use crate::services::ticket_service;

/// Fan a new ticket message out for mail/in-app notification. Best effort:
/// the message row is already committed and stays committed if this fails.
pub async fn publish_message_created(
    rabbitmq: &RabbitMQClient,
    ticket: &Ticket,
    message: &TicketMessage,
) {
    let event = Event::new(
        "ember-tickets",
        routing_keys::TICKETS_MESSAGE_CREATED,
        payloads::TicketMessageCreated {
            ticket_id: ticket.id,
            message_id: message.id,
            ticket_reference: ticket.reference.clone(),
            ticket_owner_id: ticket.user_id,
            contact_email: ticket.contact_email.clone(),
            author_id: message.author_id,
            author_is_staff: message.author_is_staff,
            subject: ticket.subject.clone(),
            body_preview: ticket_service::body_preview(&message.body),
        },
    )
    .with_user(ticket.user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::TICKETS_MESSAGE_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish ticket.message.created event");
    }
}
