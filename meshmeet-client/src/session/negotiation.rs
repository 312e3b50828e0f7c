use crate::error::{ChannelDeliveryError, NegotiationError};
use meshmeet_core::{IceCandidate, ParticipantId, SdpType, SessionDescription, SignalPayload};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use tracing::warn;

/// Candidates held back per session while no remote description is applied.
/// Further ones are dropped.
pub const MAX_QUEUED_CANDIDATES: usize = 64;

/// Offer/answer progress of one peer session.
///
/// Caller: `New -> HaveLocalOffer -> Connected`.
/// Callee: `New -> HaveRemoteOffer -> HaveLocalAnswer -> Connected`.
/// `Closed` is terminal and reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegotiationState {
    New,
    HaveLocalOffer,
    HaveRemoteOffer,
    HaveLocalAnswer,
    Connected,
    Closed,
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationState::New => "new",
            NegotiationState::HaveLocalOffer => "have-local-offer",
            NegotiationState::HaveRemoteOffer => "have-remote-offer",
            NegotiationState::HaveLocalAnswer => "have-local-answer",
            NegotiationState::Connected => "connected",
            NegotiationState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Which side created the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created when the roster reported the peer joining; sends the offer.
    Caller,
    /// Created by the first signaling message from an unknown peer.
    Callee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    CreateOffer,
    ApplyRemoteDescription,
    CreateAnswer,
    AddCandidate,
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationStep::CreateOffer => "create offer",
            NegotiationStep::ApplyRemoteDescription => "apply remote description",
            NegotiationStep::CreateAnswer => "create answer",
            NegotiationStep::AddCandidate => "add ICE candidate",
        };
        f.write_str(name)
    }
}

/// Asynchronous work against the peer connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Generate an offer and set it as local description.
    CreateOffer,
    ApplyRemote(SessionDescription),
    /// Generate an answer and set it as local description.
    CreateAnswer,
    AddCandidate(IceCandidate),
}

impl Step {
    pub fn name(&self) -> NegotiationStep {
        match self {
            Step::CreateOffer => NegotiationStep::CreateOffer,
            Step::ApplyRemote(_) => NegotiationStep::ApplyRemoteDescription,
            Step::CreateAnswer => NegotiationStep::CreateAnswer,
            Step::AddCandidate(_) => NegotiationStep::AddCandidate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepDone {
    LocalDescription(SessionDescription),
    RemoteApplied(SdpType),
    CandidateAdded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: NegotiationStep,
    pub result: Result<StepDone, NegotiationError>,
}

/// What the room loop must do next for a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Run(Step),
    Transmit(SignalPayload),
}

/// Offer/answer/candidate state machine of one peer. Performs no I/O:
/// every transition returns the [`Action`]s the caller has to carry out.
#[derive(Debug)]
pub struct Negotiation {
    peer: ParticipantId,
    role: Role,
    state: NegotiationState,
    remote_applied: bool,
    answer_in_flight: bool,
    pending_candidates: VecDeque<IceCandidate>,
    stalled: bool,
    last_error: Option<NegotiationError>,
}

impl Negotiation {
    pub fn new(peer: ParticipantId, role: Role) -> Self {
        Self {
            peer,
            role,
            state: NegotiationState::New,
            remote_applied: false,
            answer_in_flight: false,
            pending_candidates: VecDeque::new(),
            stalled: false,
            last_error: None,
        }
    }

    pub fn peer(&self) -> &ParticipantId {
        &self.peer
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// A step failed; the session will not progress without a new message or a leave.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn last_error(&self) -> Option<&NegotiationError> {
        self.last_error.as_ref()
    }

    pub fn queued_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn start_offer(&mut self) -> Result<Vec<Action>, NegotiationError> {
        self.ensure_open()?;
        Ok(vec![Action::Run(Step::CreateOffer)])
    }

    /// Glare is not resolved: an offer is accepted in any open state.
    pub fn receive_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<Vec<Action>, NegotiationError> {
        self.ensure_open()?;
        Ok(vec![Action::Run(Step::ApplyRemote(offer))])
    }

    pub fn receive_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<Vec<Action>, NegotiationError> {
        self.ensure_open()?;
        if self.state != NegotiationState::HaveLocalOffer || self.answer_in_flight {
            return Err(NegotiationError::UnexpectedAnswer {
                peer: self.peer.clone(),
                state: self.state,
            });
        }
        self.answer_in_flight = true;
        Ok(vec![Action::Run(Step::ApplyRemote(answer))])
    }

    /// Candidates are held back until a remote description is in place.
    pub fn receive_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<Vec<Action>, NegotiationError> {
        self.ensure_open()?;
        if self.remote_applied {
            return Ok(vec![Action::Run(Step::AddCandidate(candidate))]);
        }
        if self.pending_candidates.len() >= MAX_QUEUED_CANDIDATES {
            warn!(
                "Candidate queue for {} is full ({}); dropping {}",
                self.peer, MAX_QUEUED_CANDIDATES, candidate.candidate
            );
            return Ok(Vec::new());
        }
        self.pending_candidates.push_back(candidate);
        Ok(Vec::new())
    }

    pub fn step_finished(&mut self, outcome: StepOutcome) -> Vec<Action> {
        if self.state == NegotiationState::Closed {
            return Vec::new();
        }

        match outcome.result {
            Ok(StepDone::LocalDescription(desc)) => match desc.sdp_type {
                SdpType::Offer => {
                    self.state = NegotiationState::HaveLocalOffer;
                    vec![Action::Transmit(SignalPayload::Offer(desc))]
                }
                SdpType::Answer => {
                    self.state = NegotiationState::HaveLocalAnswer;
                    vec![Action::Transmit(SignalPayload::Answer(desc))]
                }
            },
            Ok(StepDone::RemoteApplied(SdpType::Offer)) => {
                self.state = NegotiationState::HaveRemoteOffer;
                self.remote_applied = true;
                let mut actions = vec![Action::Run(Step::CreateAnswer)];
                actions.extend(self.drain_candidates());
                actions
            }
            Ok(StepDone::RemoteApplied(SdpType::Answer)) => {
                self.answer_in_flight = false;
                self.state = NegotiationState::Connected;
                self.remote_applied = true;
                self.drain_candidates().collect()
            }
            Ok(StepDone::CandidateAdded) => Vec::new(),
            Err(err) => {
                if outcome.step == NegotiationStep::ApplyRemoteDescription {
                    self.answer_in_flight = false;
                }
                if outcome.step != NegotiationStep::AddCandidate {
                    self.stalled = true;
                }
                self.last_error = Some(err);
                Vec::new()
            }
        }
    }

    pub fn delivered(&mut self, payload: &SignalPayload) {
        if let SignalPayload::Answer(_) = payload {
            if self.state == NegotiationState::HaveLocalAnswer {
                self.state = NegotiationState::Connected;
            }
        }
    }

    /// An undelivered offer leaves the caller waiting forever, an undelivered
    /// answer leaves the callee half-established.
    pub fn delivery_failed(&mut self, payload: &SignalPayload, err: &ChannelDeliveryError) {
        if let SignalPayload::Candidate(_) = payload {
            return;
        }
        self.stalled = true;
        self.last_error = Some(NegotiationError::StepFailed {
            peer: self.peer.clone(),
            step: match payload {
                SignalPayload::Offer(_) => NegotiationStep::CreateOffer,
                _ => NegotiationStep::CreateAnswer,
            },
            reason: err.to_string(),
        });
    }

    /// Records a rejected inbound message without touching the state.
    pub fn note_error(&mut self, err: NegotiationError) {
        self.last_error = Some(err);
    }

    pub fn close(&mut self) {
        self.state = NegotiationState::Closed;
        self.pending_candidates.clear();
    }

    fn ensure_open(&self) -> Result<(), NegotiationError> {
        if self.state == NegotiationState::Closed {
            return Err(NegotiationError::SessionClosed(self.peer.clone()));
        }
        Ok(())
    }

    fn drain_candidates(&mut self) -> impl Iterator<Item = Action> + '_ {
        self.pending_candidates
            .drain(..)
            .map(|c| Action::Run(Step::AddCandidate(c)))
    }
}
