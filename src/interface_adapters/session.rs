use crate::domain::ports::VisitorSession;
use crate::interface_adapters::protocol::ClientSessionPayload;

impl VisitorSession for ClientSessionPayload {
    fn lease_token(&self) -> Option<String> {
        self.visitor_token.clone()
    }

    fn set_lease(&mut self, token: String, identity_number: i32, workspace_id: i64) {
        self.visitor_token = Some(token);
        self.visitor_identity = Some(identity_number);
        self.visitor_workspace = Some(workspace_id);
    }

    fn clear_lease(&mut self) {
        self.visitor_token = None;
        self.visitor_identity = None;
        self.visitor_workspace = None;
    }
}

// Markers that identify automated clients we never hand a pool slot to.
const NON_BROWSER_MARKERS: [&str; 6] = ["bot", "crawler", "spider", "curl", "wget", "python"];

// Heuristic capability check run before allocation: crawlers and scripted
// clients should not burn visitor slots. This gates the caller, not the
// allocator contract itself.
pub fn is_real_browser(user_agent: Option<&str>) -> bool {
    let Some(agent) = user_agent else {
        return false;
    };
    let agent = agent.to_ascii_lowercase();
    if !agent.contains("mozilla") {
        return false;
    }
    !NON_BROWSER_MARKERS
        .iter()
        .any(|marker| agent.contains(marker))
}
