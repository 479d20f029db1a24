//! The best-of reduction over all live candidates and their sockets.

use tracing::{debug, trace};

use crate::config::TargetingConfig;
use crate::context::EvalContext;
use crate::env::TargetingEnv;
use crate::observer::TargetingObserver;
use crate::registry::CandidateRegistry;
use crate::score::{MODIFIER_SENTINEL, TargetScorer};
use crate::types::TargetHandle;

/// Runs one selection pass over the registry and reduces to the single best
/// (candidate, socket) pair. Absence of any eligible pair is a normal
/// outcome, not an error.
///
/// Per pair the order is: cheap pre-check, modifier, then the expensive
/// post-check only if the modifier beat the best so far. A post-check veto
/// discards the pair without touching the best-so-far state, so in the
/// common case the expensive check runs once per pass, not once per pair.
pub(crate) fn run_pass(
    registry: &CandidateRegistry,
    scorer: &dyn TargetScorer,
    observers: &[Box<dyn TargetingObserver>],
    env: &TargetingEnv<'_>,
    config: &TargetingConfig,
    ctx: &mut EvalContext,
) -> Option<TargetHandle> {
    let mut best_modifier = MODIFIER_SENTINEL;
    let mut best: Option<TargetHandle> = None;

    for candidate in registry.live_candidates() {
        let Some(root_position) = env.candidates().world_position(candidate) else {
            trace!(?candidate, "candidate no longer resolves, skipped");
            continue;
        };
        if !env.candidates().can_be_captured(candidate) {
            trace!(?candidate, "candidate refused capture, skipped");
            continue;
        }
        if !scorer.candidate_check(candidate, root_position, ctx, env, config) {
            trace!(?candidate, "candidate failed the eligibility gate");
            continue;
        }

        for socket in env.candidates().sockets(candidate) {
            ctx.load_probe(env, candidate, socket);

            if !scorer.pre_check(ctx, config) {
                continue;
            }

            let modifier = scorer.compute_modifier(ctx, env, config);
            for observer in observers {
                observer.on_modifier_calculated(&ctx.probe, modifier);
            }

            // Strictly-less keeps the earliest pair on ties, and the
            // post-check only ever runs for a provisional winner.
            if modifier < best_modifier && scorer.post_check(ctx, env, config) {
                best_modifier = modifier;
                best = Some(ctx.probe.handle());
            }
        }
    }

    debug!(
        mode = %ctx.mode,
        candidates = registry.len(),
        best = ?best,
        modifier = best_modifier,
        "selection pass finished"
    );
    best
}
