//! Server ranking: score order, a latency-sorted front-runner window, and a
//! guaranteed slot for an untested server.

use tracing::trace;

use crate::config::SelectionConfig;
use crate::record::ServerRecord;

/// Rank `candidates` best first and return at most `desired` urls.
///
/// `candidates` must already be restricted to the transport family being
/// asked for. Equal scores and equal response times keep the order in which
/// the candidates were supplied.
///
/// 1. Sort by score, highest first.
/// 2. Take a window from the top while each server scores within
///    `top_score_window` of the best, above `min_qualified_score`, and has a
///    measured response time. The window never grows past `desired` or half
///    the candidate set.
/// 3. Sort the window by response time, fastest first.
/// 4. Truncate to `desired`.
/// 5. If that leaves no untested server in the list, put the first untested
///    candidate in front and truncate again.
pub fn rank_servers(
    candidates: Vec<ServerRecord>,
    desired: usize,
    config: &SelectionConfig,
) -> Vec<String> {
    if desired == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let untested = candidates
        .iter()
        .find(|r| r.is_untested())
        .map(|r| r.url.clone());

    let mut ranked = candidates;
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    let window = qualified_window(&ranked, desired, config);
    if let Some(front) = ranked.get_mut(..window) {
        front.sort_by_key(|r| r.response_time);
    }
    trace!(window, total = ranked.len(), "qualified front-runners");

    ranked.truncate(desired);
    let has_untested = ranked.iter().any(ServerRecord::is_untested);

    let mut servers: Vec<String> = ranked.into_iter().map(|r| r.url).collect();

    if !has_untested {
        if let Some(url) = untested.filter(|url| url.len() > config.min_url_len) {
            trace!(%url, "promoting untested server");
            servers.insert(0, url);
            servers.truncate(desired);
        }
    }

    servers
}

/// Length of the qualified prefix of a score-sorted slice.
fn qualified_window(ranked: &[ServerRecord], desired: usize, config: &SelectionConfig) -> usize {
    let Some(top) = ranked.first().map(|r| r.score) else {
        return 0;
    };
    let floor = top.saturating_sub(config.top_score_window);
    let size = ranked.len();

    let mut len = 0;
    for record in ranked {
        if record.score < floor
            || record.score <= config.min_qualified_score
            || record.response_time.is_none()
        {
            break;
        }
        len += 1;
        if len >= desired || len * 2 >= size {
            break;
        }
    }
    len
}
