//! Bot command dispatch and small-talk matching (spec §4.5).

use super::{calc, BotState, Injected};
use crate::state::ServerState;
use rand::Rng;

const EIGHT_BALL: [&str; 20] = [
    "It is certain.",
    "It is decidedly so.",
    "Without a doubt.",
    "Yes, definitely.",
    "You may rely on it.",
    "As I see it, yes.",
    "Most likely.",
    "Outlook good.",
    "Yes.",
    "Signs point to yes.",
    "Reply hazy, try again.",
    "Ask again later.",
    "Better not tell you now.",
    "Cannot predict now.",
    "Concentrate and ask again.",
    "Don't count on it.",
    "My reply is no.",
    "My sources say no.",
    "Outlook not so good.",
    "Very doubtful.",
];

fn is_channel(s: &str) -> bool {
    s.starts_with('#') || s.starts_with('&')
}

/// Full PRIVMSG hook: reminder delivery, last-seen tracking, small-talk,
/// and `!`-command dispatch. Returns any synthetic commands that should
/// be replayed through the normal dispatcher as `as_nick`.
pub async fn on_privmsg(
    bot: &BotState,
    server: &ServerState,
    from_nick: &str,
    target: &str,
    text: &str,
) -> Vec<Injected> {
    let now = BotState::now_epoch();
    for reminder in bot.drain_due_reminders(now).await {
        let msg = format!("reminder for {}: {}", reminder.who, reminder.text);
        bot.say(server, &reminder.where_, &msg).await;
    }

    if is_channel(target) {
        bot.record_last_seen(target, from_nick);
    }

    if !text.starts_with('!') {
        if let Some(reply) = small_talk(bot, from_nick, text) {
            let where_ = if is_channel(target) { target } else { from_nick };
            bot.say(server, where_, &reply).await;
        }
        return Vec::new();
    }

    let rest = &text[1..];
    let (cmd, arg) = match rest.find(' ') {
        Some(idx) => (&rest[..idx], rest[idx + 1..].trim()),
        None => (rest, ""),
    };
    let cmd = cmd.to_ascii_lowercase();
    let where_ = if is_channel(target) { target } else { from_nick };

    dispatch_command(bot, server, from_nick, where_, &cmd, arg).await
}

fn small_talk(bot: &BotState, from_nick: &str, text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    if lower.contains(&bot.nick.to_ascii_lowercase()) {
        return Some(format!("{from_nick}: yes?"));
    }
    if lower.contains("hello") || lower.contains("hi ") || lower.starts_with("hi") {
        return Some(format!("hi, {from_nick}"));
    }
    if lower.contains("thanks") || lower.contains("thank you") {
        return Some("you're welcome".to_string());
    }
    None
}

/// Dispatches one already-split `!command arg` pair. Replies are posted
/// directly via [`BotState::say`]; privileged actions come back as
/// [`Injected`] lines for the caller to feed through the normal path.
pub async fn dispatch_command(
    bot: &BotState,
    server: &ServerState,
    from_nick: &str,
    where_: &str,
    cmd: &str,
    arg: &str,
) -> Vec<Injected> {
    match cmd {
        "help" => {
            bot.say(
                server,
                where_,
                "help | commands | about | ping | echo <text> | who | modes | uptime | \
                 roll [XdY] | 8ball | choose a|b|c | seen <nick> | remind <dur> <msg> | \
                 poll new|vote|show|close | calc <expr>",
            )
            .await;
        }
        "commands" => {
            bot.say(
                server,
                where_,
                "help, commands, about, ping, echo, who, modes, uptime, roll, 8ball, \
                 choose, seen, remind, poll, calc",
            )
            .await;
        }
        "about" => {
            bot.say(server, where_, "a small helper bot for this relay").await;
        }
        "ping" => {
            bot.say(server, where_, "pong").await;
        }
        "echo" => {
            let text = if arg.is_empty() { "(nothing to echo)" } else { arg };
            bot.say(server, where_, text).await;
        }
        "who" => {
            if let Some(channel) = server.get_channel(where_) {
                bot.say(server, where_, &format!("{} members", channel.members.len()))
                    .await;
            } else {
                bot.say(server, where_, "not a channel").await;
            }
        }
        "modes" => {
            if let Some(channel) = server.get_channel(where_) {
                let rendered = channel.modes.read().await.render();
                let text = if rendered.is_empty() { "no modes set".to_string() } else { rendered };
                bot.say(server, where_, &text).await;
            } else {
                bot.say(server, where_, "not a channel").await;
            }
        }
        "uptime" => {
            bot.say(server, where_, &format!("up {} seconds", bot.uptime_secs()))
                .await;
        }
        "roll" => {
            let reply = cmd_roll(arg);
            bot.say(server, where_, &reply).await;
        }
        "8ball" => {
            let idx = rand::thread_rng().gen_range(0..EIGHT_BALL.len());
            bot.say(server, where_, EIGHT_BALL[idx]).await;
        }
        "choose" => {
            let reply = cmd_choose(arg);
            bot.say(server, where_, &reply).await;
        }
        "seen" => {
            let reply = cmd_seen(bot, where_, arg);
            bot.say(server, where_, &reply).await;
        }
        "remind" => {
            let reply = cmd_remind(bot, from_nick, where_, arg).await;
            bot.say(server, where_, &reply).await;
        }
        "poll" => {
            let reply = cmd_poll(bot, from_nick, where_, arg).await;
            bot.say(server, where_, &reply).await;
        }
        "calc" => {
            let reply = match calc::evaluate(arg) {
                Ok(n) => n.to_string(),
                Err(e) => format!("error: {e}"),
            };
            bot.say(server, where_, &reply).await;
        }
        "op" | "deop" | "kick" | "topic" => {
            return dispatch_privileged(bot, server, from_nick, where_, cmd, arg).await;
        }
        _ => {
            bot.say(server, where_, &format!("unknown command: {cmd}")).await;
        }
    }
    Vec::new()
}

async fn dispatch_privileged(
    bot: &BotState,
    server: &ServerState,
    from_nick: &str,
    where_: &str,
    cmd: &str,
    arg: &str,
) -> Vec<Injected> {
    if !is_channel(where_) {
        bot.say(server, where_, "use in a channel").await;
        return Vec::new();
    }
    if !bot.is_admin(from_nick) {
        bot.say(server, where_, &format!("{from_nick}: not authorized")).await;
        return Vec::new();
    }
    let line = match cmd {
        "op" if !arg.is_empty() => format!("MODE {where_} +o {arg}"),
        "deop" if !arg.is_empty() => format!("MODE {where_} -o {arg}"),
        "topic" if !arg.is_empty() => format!("TOPIC {where_} :{arg}"),
        "kick" if !arg.is_empty() => {
            let (victim, reason) = match arg.find(' ') {
                Some(idx) => (&arg[..idx], Some(&arg[idx + 1..])),
                None => (arg, None),
            };
            match reason {
                Some(r) => format!("KICK {where_} {victim} :{r}"),
                None => format!("KICK {where_} {victim}"),
            }
        }
        _ => {
            bot.say(server, where_, &format!("usage: !{cmd} <arg>")).await;
            return Vec::new();
        }
    };
    vec![Injected {
        as_nick: from_nick.to_string(),
        line,
    }]
}

fn cmd_roll(arg: &str) -> String {
    let (count, sides) = parse_dice(arg).unwrap_or((1, 6));
    let count = count.clamp(1, 50);
    let mut rng = rand::thread_rng();
    let rolls: Vec<i64> = (0..count).map(|_| rng.gen_range(1..=sides)).collect();
    let sum: i64 = rolls.iter().sum();
    let rendered = rolls.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
    format!("[{rendered}] = {sum}")
}

fn parse_dice(arg: &str) -> Option<(i64, i64)> {
    if arg.trim().is_empty() {
        return None;
    }
    let (x, y) = arg.split_once('d')?;
    let count: i64 = x.trim().parse().ok()?;
    let sides: i64 = y.trim().parse().ok()?;
    if sides < 1 {
        return None;
    }
    Some((count, sides))
}

fn cmd_choose(arg: &str) -> String {
    let options: Vec<&str> = arg.split('|').map(str::trim).filter(|s| !s.is_empty()).collect();
    if options.len() < 2 {
        return "usage: !choose a|b|c (at least two options)".to_string();
    }
    let idx = rand::thread_rng().gen_range(0..options.len());
    options[idx].to_string()
}

fn cmd_seen(bot: &BotState, channel: &str, arg: &str) -> String {
    if arg.is_empty() {
        return "usage: !seen <nick>".to_string();
    }
    match bot.seen(channel, arg) {
        Some(epoch) => {
            let elapsed = BotState::now_epoch().saturating_sub(epoch);
            format!("{arg} was last seen {} ago", format_duration(elapsed))
        }
        None => format!("never seen {arg} here"),
    }
}

fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d{}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Parses `([0-9]+[dhms])+` into a total second count.
fn parse_compact_duration(s: &str) -> Option<u64> {
    let mut total: u64 = 0;
    let mut digits = String::new();
    let mut any = false;
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if matches!(c, 'd' | 'h' | 'm' | 's') {
            let n: u64 = digits.parse().ok()?;
            digits.clear();
            let mult = match c {
                'd' => 86400,
                'h' => 3600,
                'm' => 60,
                's' => 1,
                _ => unreachable!(),
            };
            total += n * mult;
            any = true;
        } else {
            return None;
        }
    }
    if !digits.is_empty() || !any {
        return None;
    }
    Some(total)
}

async fn cmd_remind(bot: &BotState, from_nick: &str, where_: &str, arg: &str) -> String {
    let (dur, msg) = match arg.split_once(' ') {
        Some((d, m)) if !m.trim().is_empty() => (d, m),
        _ => return "usage: !remind <duration> <message>".to_string(),
    };
    let Some(secs) = parse_compact_duration(dur) else {
        return format!("bad duration: {dur}");
    };
    let due = BotState::now_epoch() + secs;
    bot.add_reminder(where_.to_string(), from_nick.to_string(), msg.to_string(), due)
        .await;
    format!("ok, will remind in {}", format_duration(secs))
}

async fn cmd_poll(bot: &BotState, from_nick: &str, where_: &str, arg: &str) -> String {
    let (sub, rest) = match arg.split_once(' ') {
        Some((s, r)) => (s, r.trim()),
        None => (arg, ""),
    };
    match sub {
        "new" => {
            let mut parts = rest.split('|').map(str::trim);
            let Some(question) = parts.next().filter(|q| !q.is_empty()) else {
                return "usage: !poll new Q | opt1 | opt2".to_string();
            };
            let options: Vec<String> = parts.filter(|s| !s.is_empty()).map(String::from).collect();
            if options.len() < 2 {
                return "a poll needs at least two options".to_string();
            }
            let id = bot
                .create_poll(where_.to_string(), question.to_string(), options)
                .await;
            format!("poll #{id} created: {question}")
        }
        "vote" => {
            let mut parts = rest.split_whitespace();
            let (Some(id), Some(n)) = (parts.next(), parts.next()) else {
                return "usage: !poll vote <id> <n>".to_string();
            };
            let (Ok(id), Ok(n)) = (id.parse::<u64>(), n.parse::<usize>()) else {
                return "usage: !poll vote <id> <n>".to_string();
            };
            match bot.vote_poll(id, from_nick, n).await {
                Ok(()) => format!("vote recorded for poll #{id}"),
                Err(e) => e,
            }
        }
        "show" => {
            let Ok(id) = rest.trim().parse::<u64>() else {
                return "usage: !poll show <id>".to_string();
            };
            match bot.show_poll(id).await {
                Some(poll) => {
                    let mut tally = vec![0usize; poll.options.len()];
                    for &choice in poll.votes.values() {
                        tally[choice] += 1;
                    }
                    let rendered = poll
                        .options
                        .iter()
                        .zip(tally.iter())
                        .enumerate()
                        .map(|(i, (opt, count))| format!("{}. {opt} ({count})", i + 1))
                        .collect::<Vec<_>>()
                        .join(" | ");
                    format!("{}: {rendered}", poll.question)
                }
                None => "no such poll".to_string(),
            }
        }
        "close" => {
            let Ok(id) = rest.trim().parse::<u64>() else {
                return "usage: !poll close <id>".to_string();
            };
            match bot.close_poll(id).await {
                Ok(()) => format!("poll #{id} closed"),
                Err(e) => e,
            }
        }
        _ => "usage: !poll new|vote|show|close ...".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_xdy() {
        assert_eq!(parse_dice("2d6"), Some((2, 6)));
        assert_eq!(parse_dice(""), None);
    }

    #[test]
    fn parses_compact_duration() {
        assert_eq!(parse_compact_duration("1h30m"), Some(5400));
        assert_eq!(parse_compact_duration("10s"), Some(10));
        assert_eq!(parse_compact_duration("abc"), None);
        assert_eq!(parse_compact_duration(""), None);
    }

    #[test]
    fn choose_requires_two_options() {
        assert_eq!(
            cmd_choose("only-one"),
            "usage: !choose a|b|c (at least two options)"
        );
        assert!(["a", "b"].contains(&cmd_choose("a|b").as_str()));
    }
}
