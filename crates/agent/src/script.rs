// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent shell program and its rendering.
//!
//! The template below is the whole remote side of the system: a line-oriented
//! job daemon written against POSIX `sh` primitives only (no arrays, no
//! bashisms), so it runs on any remote host without installing anything.
//! `@BASE@` and `@TIMEOUT@` are substituted at render time.

use sha2::{Digest, Sha256};

/// The agent program. See the module docs of each handler in the script
/// itself; the protocol it speaks is documented in `rj-protocol`.
const AGENT_TEMPLATE: &str = r##"#!/bin/sh

# This script uses only POSIX shell functionality, and does not rely on bash
# or other shell extensions.  It expects /bin/sh to be a POSIX compliant
# shell.

# ERROR and RETVAL carry return state from handler calls back to the loop.
ERROR=""
RETVAL=""

# this is where this 'daemon' keeps state for all started jobs
BASE=@BASE@

# this process terminates when idle for longer than TIMEOUT seconds
TIMEOUT=@TIMEOUT@


# --------------------------------------------------------------------
#
# the idle checker runs in the background and terminates the agent shell
# once it has been idle for longer than TIMEOUT seconds
#
trap idle_handler ALRM

idle_handler () {
  echo "IDLE TIMEOUT"
  rm -f "$BASE/idle.$$"
  touch "$BASE/timed_out.$$"
  exit 0
}

idle_checker () {

  sid=$1

  while true
  do
    sleep $TIMEOUT

    if test -e "$BASE/idle.$sid"
    then
      kill -s ALRM $sid >/dev/null 2>&1
      exit 0
    fi

    touch "$BASE/idle.$sid"
  done
}


# --------------------------------------------------------------------
#
# extract the verb from a command line (empty lines act as NOOP)
#
get_cmd () {
  if test -z "$1" ; then RETVAL="NOOP"; return;
  else                   RETVAL=`echo "$1" | tr 'a-z' 'A-Z'`; fi
}


# --------------------------------------------------------------------
#
# strip the verb from a command line, return the remaining arguments in
# a space separated string
#
get_args () {
  if test -z "$1" ; then        RETVAL="";  return;
  else                   shift; RETVAL=$@;  fi
}


# --------------------------------------------------------------------
# ensure that a given job id points to a viable working directory
verify_dir () {
  if test -z "$1" ;          then ERROR="no pid given";     return 1; fi
  DIR="$BASE/$1"
  if ! test -d "$DIR";       then ERROR="pid $1 not known"; return 1; fi
}

verify_pid () {
  verify_dir "$1" || return 1
  if ! test -r "$DIR/pid";   then ERROR="pid $1 has no process id"; return 1; fi
}

verify_state () {
  verify_dir "$1" || return 1
  if ! test -r "$DIR/state"; then ERROR="pid $1 has no state"; return 1; fi
}

verify_in () {
  verify_dir "$1" || return 1
  if ! test -r "$DIR/in";    then ERROR="pid $1 has no stdin"; return 1; fi
}

verify_out () {
  verify_dir "$1" || return 1
  if ! test -r "$DIR/out";   then ERROR="pid $1 has no stdout"; return 1; fi
}

verify_err () {
  verify_dir "$1" || return 1
  if ! test -r "$DIR/err";   then ERROR="pid $1 has no stderr"; return 1; fi
}


# --------------------------------------------------------------------
#
# uuencode a file to stdout.  Encoded by hand (od feeding awk) so that the
# remote host does not need sharutils installed; the output is the classic
# uuencode format with backtick encoding zero.
#
uu_encode () {
  echo "begin 644 /dev/stdout"
  od -v -An -tu1 "$1" | awk '
    { for (i = 1; i <= NF; i++) { b[n++] = $i } }
    function enc(v) { return sprintf("%c", v ? v + 32 : 96) }
    function line(start, len,    out, i, c1, c2, c3) {
      out = enc(len)
      for (i = start; i < start + len; i += 3) {
        c1 = b[i]
        c2 = (i + 1 < start + len) ? b[i + 1] : 0
        c3 = (i + 2 < start + len) ? b[i + 2] : 0
        out = out enc(int(c1 / 4))
        out = out enc((c1 % 4) * 16 + int(c2 / 16))
        out = out enc((c2 % 16) * 4 + int(c3 / 64))
        out = out enc(c3 % 64)
      }
      print out
    }
    END {
      s = 0
      while (s + 45 <= n) { line(s, 45); s += 45 }
      if (s < n) line(s, n - s)
      print "`"
      print "end"
    }'
}


# --------------------------------------------------------------------
#
# run a job in the background.  The returned job id is the pid of the
# dispatcher shell which forks the monitor; the pid of the job process
# itself lands in the 'pid' file of the job working directory.
#
# The spawn is a double fork: the dispatcher creates the job record and
# forks the monitor, then exits, so the foreground wait below returns
# almost immediately and leaves no zombie behind.  The monitor (and the
# job under it) are started via nohup, detached from this shell's job
# table, so they survive the agent's own death.
#
# The working directory is created on the fly.  Its name is the dispatcher
# pid and must be unique; any trace of an earlier directory of the same
# name is purged first (pid re-use).
#
# Known limitation: between starting the job and storing its pid there is
# a small window in which a crash leaves a running job whose pid is not
# recorded.  A full disk has the same effect.  PURGE cannot reap such jobs.
#
cmd_run () {
  cmd_run2 "$@" 1>/dev/null 2>/dev/null 3</dev/null &

  RJ_PID=$!
  wait $RJ_PID   # returns quickly: the dispatcher only forks the monitor
  RETVAL=$RJ_PID

  # job startup is synchronous: hold the reply until the monitor marked
  # the job RUNNING
  DIR="$BASE/$RJ_PID"

  while true
  do
    grep RUNNING "$DIR/state" >/dev/null 2>&1 && break
  done
}


cmd_run2 () {
  # dispatcher: our own pid is the job id
  RJ_PID=`sh -c 'echo $PPID'`
  DIR="$BASE/$RJ_PID"

  test -d "$DIR" && rm -rf "$DIR"   # pid re-use
  mkdir -p "$DIR" || { ERROR="cannot use job id"; return 0; }
  echo "NEW " >> "$DIR/state"

  cmd_run_process "$@" 1>/dev/null 2>/dev/null 3</dev/null &
  return 0
}


cmd_run_process () {
  # the dispatcher pid doubles as the job id
  PID=$RJ_PID
  DIR="$BASE/$PID"

  # printf, not echo: XSI echo mangles backslashes in the command line
  printf '%s\n' "$*" >  "$DIR/cmd"
  touch                 "$DIR/in"

  # the job script execs the command line with its I/O bound to the record
  cat       >  "$DIR/job.sh" <<EOT
exec sh "$DIR/cmd" < "$DIR/in" > "$DIR/out" 2> "$DIR/err"
EOT

  # the monitor waits on the job and writes its terminal state.  A wait
  # that returns while the job still exists was interrupted by a stop or
  # continue signal; the marker files left by SUSPEND/RESUME tell the
  # monitor to simply wait again.
  cat       >  "$DIR/monitor.sh" <<EOT
DIR="$DIR"
nohup /bin/sh "\$DIR/job.sh" 1>/dev/null 2>/dev/null 3</dev/null &
rpid=\$!
echo \$rpid     >  "\$DIR/pid"
echo "RUNNING " >> "\$DIR/state"

while true
do
  wait \$rpid
  retv=\$?

  if test -e "\$DIR/suspended"
  then
    rm -f "\$DIR/suspended"
    kill -0 \$rpid 2>/dev/null && continue
  fi

  if test -e "\$DIR/resumed"
  then
    rm -f "\$DIR/resumed"
    kill -0 \$rpid 2>/dev/null && continue
  fi

  # real exit -- record the exit value
  echo \$retv > "\$DIR/exit"
  test \$retv = 0          && echo "DONE "     >> "\$DIR/state"
  test \$retv = 0          || echo "FAILED "   >> "\$DIR/state"

  # a cancel marker layers CANCELED on top of the finalized state
  test -e "\$DIR/canceled" && echo "CANCELED " >> "\$DIR/state"
  test -e "\$DIR/canceled" && rm -f               "\$DIR/canceled"

  break
done
EOT

  nohup /bin/sh "$DIR/monitor.sh" 1>/dev/null 2>/dev/null 3</dev/null &
  exit 0
}


# --------------------------------------------------------------------
#
# inspect job state
#
cmd_state () {
  verify_state "$1" || return 1

  RETVAL=`grep -e ' $' "$DIR/state" | tail -n 1`
}


# --------------------------------------------------------------------
#
# wait for a job to leave the non-terminal states.  Arguments are the pid
# and, optionally, the number of seconds to wait; without it the wait only
# ends when the job does.  Reports the state found last.
#
cmd_wait () {
  verify_state "$1" || return 1

  left=$2

  while true
  do
    state=`grep -e ' $' "$DIR/state" | tail -n 1`

    case "$state" in
      "DONE "|"FAILED "|"CANCELED " ) break ;;
    esac

    if ! test -z "$left"
    then
      if test "$left" -le 0 ; then break; fi
      left=`expr "$left" - 1`
    fi

    # waiting on a job is activity; do not let the idle checker fire
    rm -f "$BASE/idle.$$"
    sleep 1
  done

  RETVAL=$state
}


# --------------------------------------------------------------------
#
# get exit code
#
cmd_result () {
  verify_state "$1" || return 1

  state=`grep -e ' $' "$DIR/state" | tail -n 1`

  if test "$state" != "DONE " -a "$state" != "FAILED " -a "$state" != "CANCELED "
  then
    ERROR="job $1 in incorrect state ($state != DONE|FAILED|CANCELED)"
    return 1
  fi

  if ! test -r "$DIR/exit"
  then
    ERROR="job $1 in incorrect state -- no exit code available"
    return 1
  fi

  RETVAL=`cat "$DIR/exit"`
}


# --------------------------------------------------------------------
#
# suspend a running job
#
cmd_suspend () {
  verify_state "$1" || return 1
  verify_pid   "$1" || return 1

  state=`grep -e ' $' "$DIR/state" | tail -n 1`
  rpid=`cat "$DIR/pid"`

  if ! test "$state" = "RUNNING "
  then
    ERROR="job $1 in incorrect state ($state != RUNNING)"
    return 1
  fi

  touch "$DIR/suspended"
  RETVAL=`kill -STOP $rpid 2>&1`
  ECODE=$?

  if test "$ECODE" = "0"
  then
    echo "SUSPENDED " >> "$DIR/state"
    echo "$state"     >  "$DIR/state.susp"
    RETVAL="$1 suspended"
  else
    rm -f "$DIR/suspended"
    ERROR="suspend failed ($ECODE): $RETVAL"
    return 1
  fi
}


# --------------------------------------------------------------------
#
# resume a suspended job; the pre-suspend state is restored from the
# snapshot taken by cmd_suspend
#
cmd_resume () {
  verify_state "$1" || return 1
  verify_pid   "$1" || return 1

  state=`grep -e ' $' "$DIR/state" | tail -n 1`
  rpid=`cat "$DIR/pid"`

  if ! test "$state" = "SUSPENDED "
  then
    ERROR="job $1 in incorrect state ($state != SUSPENDED)"
    return 1
  fi

  touch "$DIR/resumed"
  RETVAL=`kill -CONT $rpid 2>&1`
  ECODE=$?

  if test "$ECODE" = "0"
  then
    test -s "$DIR/state.susp" || echo "RUNNING " > "$DIR/state.susp"
    cat     "$DIR/state.susp" >> "$DIR/state"
    rm -f   "$DIR/state.susp"
    RETVAL="$1 resumed"
  else
    rm -f "$DIR/resumed"
    ERROR="resume failed ($ECODE): $RETVAL"
    return 1
  fi
}


# --------------------------------------------------------------------
#
# kill a job; the monitor layers CANCELED over the state it records
#
cmd_cancel () {
  verify_state "$1" || return 1
  verify_pid   "$1" || return 1

  state=`grep -e ' $' "$DIR/state" | tail -n 1`
  rpid=`cat "$DIR/pid"`

  if test "$state" != "SUSPENDED " -a "$state" != "RUNNING "
  then
    ERROR="job $1 in incorrect state ('$state' != 'SUSPENDED|RUNNING')"
    return 1
  fi

  touch "$DIR/canceled"
  RETVAL=`kill -KILL $rpid 2>&1`
  ECODE=$?

  if test "$ECODE" = "0"
  then
    RETVAL="$1 canceled"
  else
    rm -f "$DIR/canceled"
    ERROR="cancel failed ($ECODE): $RETVAL"
    return 1
  fi
}


# --------------------------------------------------------------------
#
# feed the given string to a job's stdin stream
#
cmd_stdin () {
  verify_in "$1" || return 1

  shift
  printf '%s\n' "$*" >> "$DIR/in"
  RETVAL="stdin refreshed"
}


# --------------------------------------------------------------------
#
# print uuencoded string of job's stdout
#
cmd_stdout () {
  verify_out "$1" || return 1

  RETVAL=`uu_encode "$DIR/out"`
}


# --------------------------------------------------------------------
#
# print uuencoded string of job's stderr
#
cmd_stderr () {
  verify_err "$1" || return 1

  RETVAL=`uu_encode "$DIR/err"`
}


# --------------------------------------------------------------------
#
# list all job ids
#
cmd_list () {
  RETVAL=`(cd "$BASE" && ls -1 -d */ 2>/dev/null) | cut -f 1 -d '/'`
}


# --------------------------------------------------------------------
#
# purge the working directory of the given job, or of all finished jobs
#
cmd_purge () {

  if test -z "$1"
  then
    for d in `grep -l -e 'DONE' -e 'FAILED' -e 'CANCELED' "$BASE"/*/state 2>/dev/null`
    do
      dir=`dirname "$d"`
      id=`basename "$dir"`
      rm -rf "$BASE/$id"
    done
    RETVAL="purged finished jobs"
    return 0
  fi

  verify_dir "$1" || return 1
  rm -rf "$DIR"
  RETVAL="purged $1"
}


# --------------------------------------------------------------------
#
# quit this script gracefully
#
cmd_quit () {

  # kill the idle checker
  kill $1 >/dev/null 2>&1
  rm -f "$BASE/idle.$$"

  exit 0
}


# --------------------------------------------------------------------
#
# main loop -- read command lines, dispatch, frame the replies
#
listen () {

  # we need our home base
  test -d "$BASE" || mkdir -p "$BASE" || exit 1

  # make sure we get killed when idle
  idle_checker $$ 1>/dev/null 2>/dev/null 3</dev/null &
  idle=$!

  # report the client-side pid when given
  if ! test -z "$1"
  then
    echo "PID: $1"
  fi

  # prompt for commands
  echo "PROMPT-0->"

  while read -r LINE
  do

    # reset err state for each command
    ERROR="OK"
    RETVAL=""

    get_cmd  $LINE ; cmd=$RETVAL
    get_args $LINE ; args=$RETVAL

    # invoke the right handler for each verb, or complain
    case "$cmd" in
      RUN     ) cmd_run     $args ;;
      SUSPEND ) cmd_suspend $args ;;
      RESUME  ) cmd_resume  $args ;;
      CANCEL  ) cmd_cancel  $args ;;
      RESULT  ) cmd_result  $args ;;
      STATE   ) cmd_state   $args ;;
      WAIT    ) cmd_wait    $args ;;
      STDIN   ) cmd_stdin   $args ;;
      STDOUT  ) cmd_stdout  $args ;;
      STDERR  ) cmd_stderr  $args ;;
      LIST    ) cmd_list    $args ;;
      PURGE   ) cmd_purge   $args ;;
      QUIT    ) cmd_quit    $idle ;;
      LOG     ) printf 'LOG %s\n' "$args" ;;
      NOOP    ) ERROR="NOOP"      ;;
      *       ) ERROR="$cmd unknown ($LINE)"; false ;;
    esac

    EXITVAL=$?

    # the handler reported outcome in ERROR and RETVAL.  printf, not echo:
    # payloads (uuencoded streams in particular) may contain backslashes,
    # which XSI echo would interpret
    if test "$ERROR" = "OK"
    then
      echo "OK"
      printf '%s\n' "$RETVAL"
    elif test "$ERROR" = "NOOP"
    then
      # nothing
      true
    else
      echo "ERROR"
      printf '%s\n' "$ERROR"
    fi

    # we did hard work -- not idle
    rm -f "$BASE/idle.$$"

    # well done -- prompt for the next command
    echo "PROMPT-$EXITVAL->"

  done
}


# --------------------------------------------------------------------
#
# run the main loop; it lives until QUIT or the idle timeout.  The first
# argument is the pid of the client-side process, reported back if given.
#
stty -echo   2> /dev/null
stty -echonl 2> /dev/null
listen $1
#
# --------------------------------------------------------------------
"##;

/// Remote-side settings baked into the rendered agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Root directory for job records; expanded by the remote shell.
    pub base_dir: String,
    /// Directory the agent script is installed into.
    pub script_dir: String,
    /// Seconds of inactivity after which the session self-terminates.
    pub idle_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_dir: "$HOME/.rj/jobs".to_string(),
            script_dir: "$HOME/.rj".to_string(),
            idle_timeout_secs: 30,
        }
    }
}

/// A rendered agent script, content-addressed.
#[derive(Debug, Clone)]
pub struct AgentScript {
    config: AgentConfig,
    text: String,
    hash: String,
}

impl AgentScript {
    pub fn new(config: AgentConfig) -> Self {
        let text = AGENT_TEMPLATE
            .replace("@BASE@", &config.base_dir)
            .replace("@TIMEOUT@", &config.idle_timeout_secs.to_string());
        let hash = format!("{:x}", Sha256::digest(text.as_bytes()));
        Self { config, text, hash }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The complete script text as uploaded.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// SHA-256 of the rendered text, hex encoded.
    pub fn content_hash(&self) -> &str {
        &self.hash
    }

    /// Deterministic install path; distinct renders never collide.
    pub fn remote_path(&self) -> String {
        format!("{}/agent-{}.sh", self.config.script_dir, &self.hash[..16])
    }

    /// The command line that starts an installed agent.
    ///
    /// `client_pid` identifies the client side; the agent reports it back
    /// in its `PID:` greeting.
    pub fn launch_line(&self, client_pid: u32) -> String {
        format!("sh {} {}", self.remote_path(), client_pid)
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
