//! TLS handshake protocol state machine.

pub mod client;
pub mod codec;
pub mod extensions_codec;
pub mod key_exchange;
pub mod reassembly;

use ferrite_types::TlsError;

/// Handshake message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeType {
    ClientHello = 1,
    ServerHello = 2,
    NewSessionTicket = 4,
    EncryptedExtensions = 8,
    Certificate = 11,
    CertificateRequest = 13,
    CertificateVerify = 15,
    Finished = 20,
    KeyUpdate = 24,
}

impl HandshakeType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::ClientHello),
            2 => Some(Self::ServerHello),
            4 => Some(Self::NewSessionTicket),
            8 => Some(Self::EncryptedExtensions),
            11 => Some(Self::Certificate),
            13 => Some(Self::CertificateRequest),
            15 => Some(Self::CertificateVerify),
            20 => Some(Self::Finished),
            24 => Some(Self::KeyUpdate),
            _ => None,
        }
    }
}

/// Handshake state for the client state machine.
///
/// Each non-terminal state past `Idle` names the server message the
/// client expects next. `Connected` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Initial state, before the ClientHello is sent.
    Idle,
    /// Waiting for ServerHello.
    WaitServerHello,
    /// Waiting for EncryptedExtensions.
    WaitEncryptedExtensions,
    /// Waiting for Certificate.
    WaitCertificate,
    /// Waiting for CertificateVerify.
    WaitCertificateVerify,
    /// Waiting for server Finished; exited only after the server Finished
    /// verifies AND the client Finished has been emitted.
    WaitFinished,
    /// Handshake complete.
    Connected,
    /// Error state (absorbing).
    Error,
}

impl HandshakeState {
    /// The single legal successor in the client handshake chain, if any.
    fn successor(&self) -> Option<HandshakeState> {
        match self {
            HandshakeState::Idle => Some(HandshakeState::WaitServerHello),
            HandshakeState::WaitServerHello => Some(HandshakeState::WaitEncryptedExtensions),
            HandshakeState::WaitEncryptedExtensions => Some(HandshakeState::WaitCertificate),
            HandshakeState::WaitCertificate => Some(HandshakeState::WaitCertificateVerify),
            HandshakeState::WaitCertificateVerify => Some(HandshakeState::WaitFinished),
            HandshakeState::WaitFinished => Some(HandshakeState::Connected),
            HandshakeState::Connected | HandshakeState::Error => None,
        }
    }
}

/// Structural client handshake state machine.
///
/// Validates transitions against the static chain
/// `Idle → WaitServerHello → ... → WaitFinished → Connected`; any other
/// requested transition moves the machine to `Error` before reporting.
/// `Error` is absorbing: once entered, only `reset()` leaves it. The
/// machine owns no bytes; the connection driver invokes it after each
/// successful I/O step.
#[derive(Debug)]
pub struct HandshakeStateMachine {
    state: HandshakeState,
}

impl HandshakeStateMachine {
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Idle,
        }
    }

    /// The state after the last successful step.
    pub fn current_state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the handshake has completed.
    pub fn is_completed(&self) -> bool {
        self.state == HandshakeState::Connected
    }

    /// Whether the machine is in the error state.
    pub fn is_error(&self) -> bool {
        self.state == HandshakeState::Error
    }

    /// Whether application data may flow.
    pub fn can_send_application_data(&self) -> bool {
        self.state == HandshakeState::Connected
    }

    /// Return to `Idle`, clearing any error.
    pub fn reset(&mut self) {
        self.state = HandshakeState::Idle;
    }

    /// Force the machine into the error state.
    pub fn fail(&mut self) {
        self.state = HandshakeState::Error;
    }

    /// Attempt a transition to `target`.
    ///
    /// Accepts only the successor of the current state. A rejected
    /// transition (including any transition out of `Error`) moves the
    /// machine to `Error` and returns `IllegalTransition`.
    pub fn try_transition(&mut self, target: HandshakeState) -> Result<(), TlsError> {
        if target == HandshakeState::Error {
            self.state = HandshakeState::Error;
            return Ok(());
        }
        match self.state.successor() {
            Some(next) if next == target => {
                self.state = target;
                Ok(())
            }
            _ => {
                let from = self.state;
                self.state = HandshakeState::Error;
                Err(TlsError::IllegalTransition(format!(
                    "{from:?} -> {target:?}"
                )))
            }
        }
    }
}

impl Default for HandshakeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
